//! Shared test fixtures for the shading lane
//!
//! This module provides:
//! - Bundle builders (archives with compiled-unit, descriptor, and
//!   resource entries)
//! - A minimal in-process repository stub serving configured routes over
//!   HTTP on a loopback listener, recording every request it sees

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use sha2::{Digest, Sha256};

/// Write a bundle archive with the given entries.
pub fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mtime(0);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap().flush().unwrap();
}

/// Serialize a bundle archive to bytes, for serving from the stub repo.
pub fn archive_bytes(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mtime(0);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, data.as_slice()).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Read a bundle archive into an entry-name → contents map.
pub fn read_archive(path: &Path) -> HashMap<String, Vec<u8>> {
    let mut archive = tar::Archive::new(File::open(path).unwrap());
    let mut out = HashMap::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        out.insert(name, data);
    }
    out
}

/// Minimal compiled unit declaring `name` and nothing else.
pub fn tiny_unit(name: &str) -> Vec<u8> {
    unit_with_refs(name, &[])
}

/// Compiled unit declaring `name` and referencing the given internal names.
pub fn unit_with_refs(name: &str, refs: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // minor
    out.extend_from_slice(&61u16.to_be_bytes()); // major

    let pool_entries = 2 + refs.len() * 2;
    out.extend_from_slice(&((pool_entries + 1) as u16).to_be_bytes());

    let mut push_class = |out: &mut Vec<u8>, text: &str, utf8_index: u16| {
        out.push(1); // text entry
        out.extend_from_slice(&(text.len() as u16).to_be_bytes());
        out.extend_from_slice(text.as_bytes());
        out.push(7); // class entry referencing it
        out.extend_from_slice(&utf8_index.to_be_bytes());
    };

    push_class(&mut out, name, 1);
    for (i, reference) in refs.iter().enumerate() {
        push_class(&mut out, reference, (3 + i * 2) as u16);
    }

    // access_flags, this_class, super_class, and empty member tables.
    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    for _ in 0..5 {
        out.extend_from_slice(&0u16.to_be_bytes());
    }
    out
}

/// Collect the text entries of a unit's constant pool.
pub fn pool_texts(data: &[u8]) -> Vec<String> {
    let pool_count = u16::from_be_bytes([data[8], data[9]]);
    let mut texts = Vec::new();
    let mut pos = 10usize;
    let mut index = 1u16;
    while index < pool_count {
        match data[pos] {
            1 => {
                let len = u16::from_be_bytes([data[pos + 1], data[pos + 2]]) as usize;
                texts.push(String::from_utf8(data[pos + 3..pos + 3 + len].to_vec()).unwrap());
                pos += 3 + len;
            }
            7 => pos += 3,
            other => panic!("unexpected tag {other}"),
        }
        index += 1;
    }
    texts
}

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// One route served by the stub repository.
pub struct StubRoute {
    pub status: u16,
    pub body: Vec<u8>,
    /// Exact Authorization header required; mismatch answers 401.
    pub require_auth: Option<String>,
}

impl StubRoute {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            body,
            require_auth: None,
        }
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            require_auth: None,
        }
    }

    pub fn with_auth(mut self, header: &str) -> Self {
        self.require_auth = Some(header.to_string());
        self
    }
}

/// One request observed by the stub repository.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub path: String,
    pub authorization: Option<String>,
}

/// In-process single-threaded repository stub on a loopback listener.
pub struct StubRepo {
    base_url: String,
    log: Arc<Mutex<Vec<RequestRecord>>>,
}

impl StubRepo {
    /// Start serving the given routes on an ephemeral port.
    pub fn start(routes: HashMap<String, StubRoute>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let log: Arc<Mutex<Vec<RequestRecord>>> = Arc::new(Mutex::new(Vec::new()));

        let thread_log = Arc::clone(&log);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve_one(stream, &routes, &thread_log);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            log,
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of every request seen so far.
    pub fn requests(&self) -> Vec<RequestRecord> {
        self.log.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

fn serve_one(
    mut stream: TcpStream,
    routes: &HashMap<String, StubRoute>,
    log: &Arc<Mutex<Vec<RequestRecord>>>,
) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(_) => return,
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();

    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }

    log.lock().unwrap().push(RequestRecord {
        path: path.clone(),
        authorization: authorization.clone(),
    });

    let (status, body) = match routes.get(&path) {
        Some(route) => match &route.require_auth {
            Some(required) if authorization.as_deref() != Some(required.as_str()) => {
                (401, b"unauthorized".to_vec())
            }
            _ => (route.status, route.body.clone()),
        },
        None => (404, b"not found".to_vec()),
    };

    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}
