//! End-to-end tests that drive a real `duskdb` server over a loopback TCP
//! socket, the way a Redis client library would. Each test binds its own
//! server on an ephemeral port so tests can run concurrently.

use duskdb::db::Db;
use duskdb::hub::Hub;
use duskdb::{Connection, Frame};

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};

async fn spawn_server() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let db = Db::new(16);
    let hub = Hub::new();
    tokio::spawn(async move {
        duskdb::server::run(listener, db, hub, std::future::pending::<()>()).await;
    });
    addr
}

async fn connect(addr: std::net::SocketAddr) -> Connection {
    let socket = TcpStream::connect(addr).await.unwrap();
    Connection::new(socket)
}

fn bulk_array(parts: &[&str]) -> Frame {
    Frame::Array(
        parts
            .iter()
            .map(|p| Frame::Bulk(Bytes::from(p.to_string())))
            .collect(),
    )
}

async fn cmd(conn: &mut Connection, parts: &[&str]) -> Frame {
    conn.write_frame(&bulk_array(parts)).await.unwrap();
    conn.read_frame().await.unwrap().expect("connection closed")
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::from(s.to_string()))
}

#[tokio::test]
async fn set_get_strlen() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(cmd(&mut conn, &["SET", "foo", "bar"]).await, Frame::Simple("OK".into()));
    assert_eq!(cmd(&mut conn, &["GET", "foo"]).await, bulk("bar"));
    assert_eq!(cmd(&mut conn, &["STRLEN", "foo"]).await, Frame::Integer(3));
}

#[tokio::test]
async fn list_push_range_pop_len() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(cmd(&mut conn, &["LPUSH", "L", "a", "b", "c"]).await, Frame::Integer(3));
    assert_eq!(
        cmd(&mut conn, &["LRANGE", "L", "0", "-1"]).await,
        Frame::Array(vec![bulk("c"), bulk("b"), bulk("a")])
    );
    assert_eq!(cmd(&mut conn, &["RPOP", "L"]).await, bulk("a"));
    assert_eq!(cmd(&mut conn, &["LLEN", "L"]).await, Frame::Integer(2));
}

#[tokio::test]
async fn zset_add_rangebyscore_incrby_range() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(cmd(&mut conn, &["ZADD", "Z", "1", "a", "2", "b", "3", "c"]).await, Frame::Integer(3));
    assert_eq!(
        cmd(&mut conn, &["ZRANGEBYSCORE", "Z", "2", "3", "WITHSCORES"]).await,
        Frame::Array(vec![bulk("b"), bulk("2"), bulk("c"), bulk("3")])
    );
    assert_eq!(cmd(&mut conn, &["ZINCRBY", "Z", "10", "a"]).await, bulk("11"));
    assert_eq!(
        cmd(&mut conn, &["ZRANGE", "Z", "0", "-1"]).await,
        Frame::Array(vec![bulk("b"), bulk("c"), bulk("a")])
    );
}

#[tokio::test]
async fn expiry_makes_key_absent_after_ttl() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(
        cmd(&mut conn, &["SET", "k", "v", "PX", "50"]).await,
        Frame::Simple("OK".into())
    );
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert_eq!(cmd(&mut conn, &["GET", "k"]).await, Frame::Null);
    assert_eq!(cmd(&mut conn, &["EXISTS", "k"]).await, Frame::Integer(0));
}

#[tokio::test]
async fn hash_set_incrby_getall() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(
        cmd(&mut conn, &["HSET", "u", "name", "John", "age", "30"]).await,
        Frame::Integer(2)
    );
    assert_eq!(cmd(&mut conn, &["HINCRBY", "u", "age", "1"]).await, Frame::Integer(31));

    let reply = cmd(&mut conn, &["HGETALL", "u"]).await;
    match reply {
        Frame::Array(items) => {
            let pairs: Vec<String> = items
                .into_iter()
                .map(|f| match f {
                    Frame::Bulk(b) => String::from_utf8(b.to_vec()).unwrap(),
                    other => panic!("unexpected frame {other:?}"),
                })
                .collect();
            assert_eq!(pairs.len(), 4);
            assert!(pairs.contains(&"name".to_string()));
            assert!(pairs.contains(&"31".to_string()));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[tokio::test]
async fn publish_reaches_subscriber() {
    let addr = spawn_server().await;
    let mut subscriber = connect(addr).await;
    let mut publisher = connect(addr).await;

    let ack = cmd(&mut subscriber, &["SUBSCRIBE", "ch"]).await;
    assert_eq!(
        ack,
        Frame::Array(vec![bulk("subscribe"), bulk("ch"), Frame::Integer(1)])
    );

    assert_eq!(cmd(&mut publisher, &["PUBLISH", "ch", "hello"]).await, Frame::Integer(1));

    let pushed = subscriber.read_frame().await.unwrap().unwrap();
    assert_eq!(
        pushed,
        Frame::Array(vec![bulk("message"), bulk("ch"), bulk("hello")])
    );
}

#[tokio::test]
async fn multi_exec_applies_queued_commands_atomically() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(cmd(&mut conn, &["SET", "x", "0"]).await, Frame::Simple("OK".into()));
    assert_eq!(cmd(&mut conn, &["MULTI"]).await, Frame::Simple("OK".into()));
    assert_eq!(cmd(&mut conn, &["INCR", "x"]).await, Frame::Simple("QUEUED".into()));
    assert_eq!(cmd(&mut conn, &["INCR", "x"]).await, Frame::Simple("QUEUED".into()));
    assert_eq!(
        cmd(&mut conn, &["EXEC"]).await,
        Frame::Array(vec![Frame::Integer(1), Frame::Integer(2)])
    );
    assert_eq!(cmd(&mut conn, &["GET", "x"]).await, bulk("2"));
}

#[tokio::test]
async fn exec_without_multi_is_an_error() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    match cmd(&mut conn, &["EXEC"]).await {
        Frame::Error(msg) => assert!(msg.contains("EXEC without MULTI")),
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn wrong_type_against_a_string_key_fails() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    assert_eq!(cmd(&mut conn, &["SET", "k", "v"]).await, Frame::Simple("OK".into()));
    match cmd(&mut conn, &["LPUSH", "k", "x"]).await {
        Frame::Error(msg) => assert!(msg.starts_with("WRONGTYPE")),
        other => panic!("expected WRONGTYPE error, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_incr_from_many_clients_lands_exactly() {
    let addr = spawn_server().await;

    let clients = 8usize;
    let increments_per_client = 25usize;
    let mut handles = Vec::new();
    for _ in 0..clients {
        handles.push(tokio::spawn(async move {
            let mut conn = connect(addr).await;
            for _ in 0..increments_per_client {
                cmd(&mut conn, &["INCR", "counter"]).await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let mut conn = connect(addr).await;
    assert_eq!(
        cmd(&mut conn, &["GET", "counter"]).await,
        bulk((clients * increments_per_client).to_string().as_str())
    );
}

#[tokio::test]
async fn subscribed_connection_rejects_ordinary_commands() {
    let addr = spawn_server().await;
    let mut conn = connect(addr).await;

    cmd(&mut conn, &["SUBSCRIBE", "ch"]).await;
    match cmd(&mut conn, &["GET", "foo"]).await {
        Frame::Error(msg) => assert!(msg.contains("only (P)SUBSCRIBE")),
        other => panic!("expected subscribe-mode error, got {other:?}"),
    }
}
