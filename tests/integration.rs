use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use poemview::api::{ApiClient, FetchError, PoemSource};
use poemview::controller::{Controller, ControllerSettings};
use poemview::location::Location;
use poemview::view::{NOTHING_FOUND, SimilarPane, TOO_MANY_REQUESTS};

const TIMEOUT: Duration = Duration::from_secs(5);

fn poem_json(id: u32, name: &str) -> String {
    format!(
        r#"{{"id": {id}, "name": "{name}", "author": "Лермонтов", "text": "строка 1\nстрока 2\nстрока 3\nстрока 4", "date_from": 1832, "date_to": null}}"#
    )
}

/// Canned responses keyed on the request target.
fn route(target: &str) -> (u16, String) {
    match target {
        "/poems/random" | "/poems/1" => (200, poem_json(1, "Парус")),
        "/poems/2" => (200, poem_json(2, "Тучи")),
        "/poems/bad" => (200, "not json".into()),
        "/poems/similar/1" => {
            let list: Vec<String> = (2..=5).map(|id| poem_json(id, &format!("P{id}"))).collect();
            (200, format!("[{}]", list.join(",")))
        }
        "/poems/similar/2" => (429, r#"{"detail": "slow down"}"#.into()),
        t if t.starts_with("/poems/search?query_text=sail") => (200, format!("[{}]", poem_json(1, "Парус"))),
        t if t.starts_with("/poems/search") => (200, "[]".into()),
        _ => (404, r#"{"detail": "not found"}"#.into()),
    }
}

struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                respond(stream, &log);
            }
        });
        Self {
            base_url: format!("http://{addr}/"),
            requests,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, TIMEOUT)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

fn respond(mut stream: TcpStream, log: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 || header == "\r\n" {
            break;
        }
    }

    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    log.lock().expect("request log").push(target.clone());

    let (status, body) = route(&target);
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        _ => "Error",
    };
    let _ = write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.flush();
}

#[test]
fn test_client_fetches_random_and_by_id() {
    let _ = env_logger::try_init();
    let server = CannedServer::start();
    let client = server.client();
    assert!(!client.base_url().ends_with('/'));

    let random = client.random().expect("random poem");
    assert_eq!(random.id, "1");
    assert_eq!(random.title(), "Парус");
    assert_eq!(random.date_label(), "1832");

    let poem = client.by_id("2").expect("poem 2");
    assert_eq!(poem.title(), "Тучи");
    assert_eq!(poem.preview(3), vec!["строка 1", "строка 2", "строка 3"]);

    assert_eq!(server.requests(), vec!["/poems/random", "/poems/2"]);
}

#[test]
fn test_client_error_classes() {
    let _ = env_logger::try_init();
    let server = CannedServer::start();
    let client = server.client();

    assert_eq!(client.similar("2"), Err(FetchError::RateLimited));
    assert_eq!(client.by_id("404"), Err(FetchError::Status(404)));
    assert!(matches!(client.by_id("bad"), Err(FetchError::Decode(_))));
}

#[test]
fn test_client_transport_failure() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        listener.local_addr().expect("local addr")
    };
    // listener dropped: nothing accepts on this port any more
    let client = ApiClient::new(&format!("http://{addr}"), TIMEOUT);
    assert!(matches!(client.random(), Err(FetchError::Transport(_))));
}

#[test]
fn test_search_sends_query_and_limit() {
    let _ = env_logger::try_init();
    let server = CannedServer::start();
    let client = server.client();

    let hits = client.search("sail", 1).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(
        server.requests(),
        vec!["/poems/search?query_text=sail&poems_num=1"]
    );
}

#[test]
fn test_navigation_round_trip() {
    let _ = env_logger::try_init();
    let server = CannedServer::start();
    let client = server.client();
    let mut controller = Controller::new(ControllerSettings::default());

    let jobs = controller.start(Location::poem("1"));
    controller.drive(&client, jobs);
    assert_eq!(controller.view().title, "Парус");
    assert_eq!(controller.location(), &Location::poem("1"));
    let ids: Vec<&str> = controller
        .view()
        .similar
        .entries()
        .iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(ids, vec!["2", "3", "4"]);

    let jobs = controller.open_similar(0);
    controller.drive(&client, jobs);
    assert_eq!(controller.view().title, "Тучи");
    assert_eq!(controller.location(), &Location::poem("2"));
    assert_eq!(
        controller.view().similar,
        SimilarPane::Message(TOO_MANY_REQUESTS.into())
    );
    assert_eq!(controller.history().len(), 2);

    let jobs = controller.back();
    controller.drive(&client, jobs);
    assert_eq!(controller.view().title, "Парус");
    assert_eq!(controller.location(), &Location::poem("1"));
    assert!(controller.history().can_go_forward());

    assert_eq!(
        server.requests(),
        vec![
            "/poems/1",
            "/poems/similar/1",
            "/poems/2",
            "/poems/similar/2",
            "/poems/1",
            "/poems/similar/1",
        ]
    );
}

#[test]
fn test_search_miss_clears_view() {
    let _ = env_logger::try_init();
    let server = CannedServer::start();
    let client = server.client();
    let mut controller = Controller::new(ControllerSettings::default());

    let jobs = controller.start(Location::poem("1"));
    controller.drive(&client, jobs);
    assert!(controller.view().has_poem());

    let jobs = controller.search_poems_by_text("nothing");
    controller.drive(&client, jobs);
    assert_eq!(controller.view().title, NOTHING_FOUND);
    assert!(controller.view().author.is_empty());
    assert!(controller.view().text.is_empty());
    assert!(!controller.view().has_poem());
}
