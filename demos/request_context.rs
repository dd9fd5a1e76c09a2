//! Two interleaved "requests" with isolated ambient contexts

use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Request {
    id: u64,
    user: String,
}

fn main() {
    ambient::enable();

    let rt = ambient::EventLoop::new();

    // Each request becomes its own causal root; nothing downstream ever
    // mentions the request again, yet every callback resolves to it.
    for (id, user) in [(1, "alice"), (2, "bob")] {
        rt.spawn(move || {
            ambient::set(Request {
                id,
                user: user.to_string(),
            });
            println!("request {id} accepted for {user}");
            handle_request();
        });
    }

    rt.run();
}

fn handle_request() {
    ambient::set_timeout(Duration::from_millis(10), || {
        ambient::queue_microtask(|| {
            let req: Rc<Request> = ambient::get();
            println!("request {} authorized user {}", req.id, req.user);
        });
    });
}
