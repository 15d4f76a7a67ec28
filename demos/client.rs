use std::sync::Arc;

use chat_realtime::{RealtimeEvent, Session};

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let token = std::env::var("CHAT_TOKEN")
        .map_err(|_| {
            println!("No CHAT_TOKEN env var or invalid");
            std::process::exit(1);
        })
        .unwrap();

    let session = Session::from_env().unwrap();

    let _subscription = session.subscribe(Arc::new(|event: &RealtimeEvent| {
        println!("{}: {}", event.r#type, event.payload);
    }));

    let mut status = session.watch_status();
    session.connect(&token);

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let now = *status.borrow_and_update();
                println!("status: {:?} via {:?}", now.status, now.transport);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.disconnect();
}
