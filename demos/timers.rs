//! Timer and microtask causality

use std::time::Duration;

fn main() {
    ambient::enable();

    let rt = ambient::EventLoop::new();

    rt.spawn(|| {
        ambient::set("deploy-7".to_string());

        ambient::set_timeout(Duration::from_millis(20), || {
            println!("[{}] slow timer fired", ambient::get::<String>());
        });

        ambient::set_timeout(Duration::from_millis(5), || {
            println!("[{}] fast timer fired", ambient::get::<String>());
            ambient::queue_microtask(|| {
                println!("[{}] microtask after fast timer", ambient::get::<String>());
            });
        });
    });

    rt.run();
}
