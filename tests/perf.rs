use std::sync::Arc;
use std::time::Instant;

use microbord::{Bord, Config, MemoryStore, RegistrationForm, SystemClock};

const NUM_USERS: usize = 100;
const POSTS_PER_USER: usize = 2;
const LOADED_USER_NAME: &str = "bob";
const LOADED_USER_POSTS: usize = 50;

#[ignore]
#[test]
fn perf_test_users_with_posts() {
    let bord = Bord::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), Config::new("perf"));
    let start = Instant::now();

    println!("\n=== Performance Test ===");
    println!("Creating {} users with {} posts each...", NUM_USERS, POSTS_PER_USER);

    let user_creation_start = Instant::now();
    let mut users = Vec::with_capacity(NUM_USERS);
    for i in 0..NUM_USERS {
        let username = format!("perf_user_{i}");
        let user = bord
            .users
            .register(&RegistrationForm {
                username: username.clone(),
                email: format!("{username}@example.com"),
                password: "password123".into(),
                password2: "password123".into(),
            })
            .expect("Failed to create user");
        for p in 0..POSTS_PER_USER {
            bord.posts
                .create_post(&user.id, &format!("post {p} from {username}"))
                .expect("Failed to create post");
        }
        users.push(user);
    }
    println!("Users and posts created in {:?}", user_creation_start.elapsed());

    let loaded = bord
        .users
        .register(&RegistrationForm {
            username: LOADED_USER_NAME.into(),
            email: "bob@example.com".into(),
            password: "bob".into(),
            password2: "bob".into(),
        })
        .expect("Failed to create loaded user");
    for p in 0..LOADED_USER_POSTS {
        bord.posts.create_post(&loaded.id, &format!("bob post {p}")).unwrap();
    }
    for user in &users {
        bord.graph.follow(&loaded.id, &user.id).unwrap();
    }

    let feed_start = Instant::now();
    let mut page = 1;
    let mut seen = 0;
    loop {
        let feed = bord.feed.followed_feed(&loaded.id, page, 20).unwrap();
        seen += feed.items.len();
        if !feed.has_next {
            break;
        }
        page += 1;
    }
    println!("Walked {} feed pages ({} posts) in {:?}", page, seen, feed_start.elapsed());
    assert_eq!(seen, NUM_USERS * POSTS_PER_USER + LOADED_USER_POSTS);

    println!("Total: {:?}", start.elapsed());
}
