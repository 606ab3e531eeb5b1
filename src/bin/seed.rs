use microbord::core::db::init_test_data;
use microbord::core::helpers::init_tracing;
use microbord::{Bord, Config};

fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let config = Config::from_env();
    let bord = Bord::in_memory(config);
    init_test_data(&bord)?;

    let test = bord
        .users
        .find_by_username("test")?
        .ok_or_else(|| anyhow::anyhow!("seed user missing"))?;

    println!("Home feed for {}:", test.username);
    let mut page = 1;
    loop {
        let feed = bord.feed.followed_feed(&test.id, page, bord.posts_per_page)?;
        for post in &feed.items {
            let author = bord.users.require(&post.author_id)?;
            println!("  [{}] {}: {}", post.created_at.to_rfc3339(), author.username, post.body);
        }
        if !feed.has_next {
            break;
        }
        page += 1;
    }

    let explore = bord.feed.global_feed(1, bord.posts_per_page)?;
    println!("Explore: {} posts in total", explore.total);

    Ok(())
}
