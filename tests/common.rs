use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use keva::domains::interface::{TRead, TWrite};
use keva::domains::query_io::QueryIO;
use keva::{Secret, SessionConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

type Store = Arc<Mutex<HashMap<String, (String, Option<Instant>)>>>;

/// In-process stand-in for the remote store, speaking just enough of the
/// wire protocol for the session under test: AUTH, SELECT, PING, SET with
/// optional PX expiry, GET with lazy expiration.
pub struct MockStore {
    pub addr: SocketAddr,
    password: Option<String>,
}

impl MockStore {
    pub async fn start(password: Option<&str>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let password = password.map(str::to_string);

        let store: Store = Arc::new(Mutex::new(HashMap::new()));
        let expected = password.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(handle_connection(socket, store.clone(), expected.clone()));
            }
        });

        MockStore { addr, password }
    }

    pub fn config(&self) -> SessionConfig {
        let config = SessionConfig::default()
            .set_host(self.addr.ip().to_string())
            .set_port(self.addr.port());
        match &self.password {
            Some(pw) => config.set_credential(Secret::new(pw)),
            None => config,
        }
    }
}

async fn handle_connection(mut socket: TcpStream, store: Store, expected: Option<String>) {
    let mut authed = expected.is_none();

    loop {
        let Ok(values) = socket.read_values().await else {
            return;
        };

        for value in values {
            let args = match unpack_command(value) {
                Some(args) => args,
                None => {
                    respond(&mut socket, QueryIO::Err("ERR protocol error".into())).await;
                    continue;
                }
            };

            let reply = dispatch(&args, &store, &expected, &mut authed).await;
            respond(&mut socket, reply).await;
        }
    }
}

async fn dispatch(
    args: &[String],
    store: &Store,
    expected: &Option<String>,
    authed: &mut bool,
) -> QueryIO {
    match args[0].to_uppercase().as_str() {
        "AUTH" => match expected {
            Some(pw) if args.len() == 2 && &args[1] == pw => {
                *authed = true;
                QueryIO::SimpleString("OK".into())
            }
            Some(_) => QueryIO::Err("ERR invalid password".into()),
            None => QueryIO::Err("ERR Client sent AUTH, but no password is set".into()),
        },
        _ if !*authed => QueryIO::Err("NOAUTH Authentication required.".into()),
        "PING" => QueryIO::SimpleString("PONG".into()),
        "SELECT" => match args.get(1).and_then(|s| s.parse::<u16>().ok()) {
            Some(_) => QueryIO::SimpleString("OK".into()),
            None => QueryIO::Err("ERR invalid DB index".into()),
        },
        "SET" => {
            let deadline = match args.get(3).map(|s| s.to_uppercase()) {
                Some(px) if px == "PX" => {
                    let millis: u64 = args[4].parse().unwrap();
                    Some(Instant::now() + Duration::from_millis(millis))
                }
                _ => None,
            };
            store.lock().await.insert(args[1].clone(), (args[2].clone(), deadline));
            QueryIO::SimpleString("OK".into())
        }
        "GET" => {
            let mut guard = store.lock().await;
            match guard.get(&args[1]) {
                Some((_, Some(deadline))) if Instant::now() >= *deadline => {
                    guard.remove(&args[1]);
                    QueryIO::Null
                }
                Some((value, _)) => QueryIO::BulkString(Bytes::from(value.clone())),
                None => QueryIO::Null,
            }
        }
        cmd => QueryIO::Err(format!("ERR unknown command '{cmd}'").into()),
    }
}

fn unpack_command(value: QueryIO) -> Option<Vec<String>> {
    let QueryIO::Array(items) = value else {
        return None;
    };
    let args = items
        .into_iter()
        .filter_map(|item| item.unpack_single_entry::<String>().ok())
        .collect::<Vec<_>>();
    if args.is_empty() { None } else { Some(args) }
}

async fn respond(socket: &mut TcpStream, reply: QueryIO) {
    let _ = socket.write(&reply.serialize()).await;
}
