use std::io::Cursor;
use std::sync::Arc;

use admin::{AdminEditSession, AdminGate};
use api::ApiContext;
use board::wire::ShopInfo;
use boardctl::{login, run, Console, RuntimeReader};
use metrics::MetricsHandle;
use storage::Store;
use sync::{HttpPriceSource, PriceSource, SnapshotCache};
use tokio::sync::oneshot;

async fn start_server() -> (String, oneshot::Sender<()>) {
    let ctx = Arc::new(ApiContext::new(
        Arc::new(Store::new("sqlite::memory:")),
        MetricsHandle::new().expect("metrics"),
        ShopInfo {
            name: "Tiệm Vàng ABC".into(),
            address: "1 Main St".into(),
            hotline: "0900000000".into(),
        },
    ));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (addr, server) = api::bind(ctx, ([127, 0, 0, 1], 0).into(), async {
        let _ = stop_rx.await;
    })
    .expect("bind");
    tokio::spawn(server);
    (format!("http://{addr}"), stop_tx)
}

fn console(script: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
    Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
}

fn output(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(console.into_output()).expect("utf8 output")
}

#[test]
fn login_locks_after_three_misses() {
    let mut console = console("a\nb\nc\npassword\n");
    assert!(!login(&mut console, AdminGate::new("password")).expect("io"));
    let out = output(console);
    assert!(out.contains("2 attempt(s) left"));
    assert!(out.contains("1 attempt(s) left"));
    assert!(out.contains("Too many wrong attempts."));
}

#[test]
fn login_accepts_the_secret() {
    let mut console = console("nope\npassword\n");
    assert!(login(&mut console, AdminGate::new("password")).expect("io"));
}

#[tokio::test]
async fn scripted_edit_and_save_reaches_the_server() {
    let (base, _stop) = start_server().await;
    let source = Arc::new(HttpPriceSource::new(&base).expect("endpoint"));
    let mut session = AdminEditSession::new(Arc::clone(&source), SnapshotCache::new());

    let mut console = console(
        "buy 1 82.000.000\n\
         sell 1 83,000,000\n\
         name 6 ignored\n\
         add\n\
         name 6 Nhẫn 9999\n\
         save 1\n\
         delete 2\n\
         n\n\
         delete 3\n\
         y\n\
         list\n\
         quit\n",
    );
    run(&mut console, &mut session).await.expect("console io");
    let out = output(console);

    assert!(out.contains("loaded 5 item(s)"));
    assert!(out.contains("error: no item with id 6"));
    assert!(out.contains("added item 6"));
    assert!(out.contains("[ok] Saved prices for SJC 9999!"));
    assert!(out.contains("Delete \"SJC 980\"? [y/N] kept"));
    assert!(out.contains("[info] Deleted PNJ 9999"));
    assert!(out.contains("82.000.000"));

    let stored = source.fetch().await.expect("fetch");
    let ids: Vec<i64> = stored.items.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5, 6]);
    assert_eq!(stored.get(1).map(|item| item.sell), Some(83_000_000));
    assert_eq!(stored.get(6).map(|item| item.name.as_str()), Some("Nhẫn 9999"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runtime_reader_serves_a_session_on_a_worker_thread() {
    let (base, _stop) = start_server().await;
    let source = Arc::new(HttpPriceSource::new(&base).expect("endpoint"));
    let mut session = AdminEditSession::new(source, SnapshotCache::new());

    let script = Cursor::new(b"password\nlist\nquit\n".to_vec());
    let mut console = Console::new(RuntimeReader::new(script), Vec::new());
    assert!(login(&mut console, AdminGate::new("password")).expect("io"));
    run(&mut console, &mut session).await.expect("session");

    let out = String::from_utf8(console.into_output()).expect("utf8 output");
    assert!(out.contains("loaded 5 item(s)"));
    assert!(out.contains("SJC 9999"));
}
