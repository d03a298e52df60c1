use super::*;

#[parameterized(
    list_posts_allow = { "", "listPosts", true },
    get_post_allow = { "post1", "getPost", true },
    create_post_deny = { "", "createPost", false },
    get_post_without_id_deny = { "", "getPost", false },
    list_posts_with_id_deny = { "post1", "listPosts", false },
)]
fn test_anonymous_reader(resource: &str, action: &str, allowed: bool) {
    let model = model_from_policy(TEST_POLICY);
    let decision = decide(&model, "system:anonymous", resource, action);
    assert_eq!(decision.is_allow(), allowed, "{decision}");
}

#[test]
fn test_promoted_subject_may_create() {
    let model = model_from_policy(TEST_POLICY);
    assert_deny(&decide(&model, "user1", "", "createPost"));

    model.add_group_edge("user1", "system:authenticated");

    assert_allow(&decide(&model, "user1", "", "createPost"));
    assert_allow(&decide(&model, "user1", "post9", "getPost"));
    // Promotion does not make the subject anonymous-equivalent.
    assert!(!model.groups_of("user1").contains("system:unauthenticated"));
}

#[test]
fn test_evaluation_during_group_writes() {
    use std::thread;

    let model = model_from_policy(TEST_POLICY);
    let writer = {
        let model = model.clone();
        thread::spawn(move || {
            for i in 0..100 {
                model.add_group_edge(&format!("user{i}"), "system:authenticated");
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let model = model.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_allow(&decide(&model, "system:anonymous", "", "listPosts"));
                    assert_deny(&decide(&model, "system:anonymous", "", "createPost"));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_allow(&decide(&model, "user99", "", "createPost"));
}
