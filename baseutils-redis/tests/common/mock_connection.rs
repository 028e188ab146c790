//! In-memory [`Connection`] implementations for facade tests.
//!
//! `MockConnection` interprets the subset of commands the facade sends and
//! counts every call. It relies on the trait's default pub/sub methods, so it
//! behaves like a backend without publish support. `PubSubMock` adds
//! publish/subscribe on top of it through a broadcast channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use baseutils_redis::redis::{Arg, Cmd, ErrorKind, RedisError, Value};
use baseutils_redis::{Connection, Error, Message, Subscription, Topology};
use dashmap::DashMap;
use futures::stream;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Data {
    Str(Vec<u8>),
    Hash(HashMap<String, Vec<u8>>),
}

#[derive(Debug, Clone)]
struct Entry {
    data: Data,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none_or(|at| Instant::now() < at)
    }
}

#[derive(Clone)]
pub struct MockConnection {
    topology: Topology,
    store: Arc<DashMap<String, Entry>>,
    calls: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            store: Arc::new(DashMap::new()),
            calls: Arc::new(AtomicUsize::new(0)),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn single() -> Self {
        Self::new(Topology::Single)
    }

    pub fn cluster() -> Self {
        Self::new(Topology::Cluster)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.store.insert(
            key.to_owned(),
            Entry {
                data: Data::Str(value.to_vec()),
                expires_at: None,
            },
        );
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let entry = self.store.get(key).map(|entry| entry.clone())?;
        if entry.is_live() {
            Some(entry)
        } else {
            self.store.remove(key);
            None
        }
    }

    fn execute(&self, args: Vec<Vec<u8>>) -> Result<Value, RedisError> {
        let mut args = args.into_iter().map(|arg| String::from_utf8_lossy(&arg).into_owned());
        let name = args.next().unwrap_or_default().to_uppercase();
        let args: Vec<String> = args.collect();
        self.commands.lock().unwrap().push(name.clone());

        match name.as_str() {
            "PING" => Ok(Value::SimpleString("PONG".to_owned())),
            "GET" => match self.live(&args[0]).map(|entry| entry.data) {
                None => Ok(Value::Nil),
                Some(Data::Str(bytes)) => Ok(Value::BulkString(bytes)),
                Some(Data::Hash(_)) => Err(wrong_type()),
            },
            "SET" => self.set(&args),
            "MGET" => Ok(Value::Array(
                args.iter()
                    .map(|key| match self.live(key).map(|entry| entry.data) {
                        Some(Data::Str(bytes)) => Value::BulkString(bytes),
                        _ => Value::Nil,
                    })
                    .collect(),
            )),
            "HSET" => {
                let mut hash = match self.live(&args[0]) {
                    None => HashMap::new(),
                    Some(Entry {
                        data: Data::Hash(hash),
                        ..
                    }) => hash,
                    Some(_) => return Err(wrong_type()),
                };
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    if hash
                        .insert(pair[0].clone(), pair[1].as_bytes().to_vec())
                        .is_none()
                    {
                        added += 1;
                    }
                }
                self.store.insert(
                    args[0].clone(),
                    Entry {
                        data: Data::Hash(hash),
                        expires_at: None,
                    },
                );
                Ok(Value::Int(added))
            }
            "HGET" => match self.live(&args[0]).map(|entry| entry.data) {
                Some(Data::Hash(hash)) => Ok(hash
                    .get(&args[1])
                    .map_or(Value::Nil, |v| Value::BulkString(v.clone()))),
                None => Ok(Value::Nil),
                Some(Data::Str(_)) => Err(wrong_type()),
            },
            "HDEL" => match self.store.get_mut(&args[0]) {
                Some(mut entry) => match &mut entry.data {
                    Data::Hash(hash) => Ok(Value::Int(i64::from(hash.remove(&args[1]).is_some()))),
                    Data::Str(_) => Err(wrong_type()),
                },
                None => Ok(Value::Int(0)),
            },
            "HGETALL" => match self.live(&args[0]).map(|entry| entry.data) {
                Some(Data::Hash(hash)) => Ok(Value::Map(
                    hash.into_iter()
                        .map(|(field, value)| {
                            (Value::BulkString(field.into_bytes()), Value::BulkString(value))
                        })
                        .collect(),
                )),
                None => Ok(Value::Map(Vec::new())),
                Some(Data::Str(_)) => Err(wrong_type()),
            },
            "PEXPIRE" => {
                let millis: u64 = args[1].parse().map_err(|_| not_integer())?;
                match self.store.get_mut(&args[0]) {
                    Some(mut entry) => {
                        entry.expires_at = Some(Instant::now() + Duration::from_millis(millis));
                        Ok(Value::Int(1))
                    }
                    None => Ok(Value::Int(0)),
                }
            }
            "EXISTS" => Ok(Value::Int(
                args.iter().filter(|key| self.live(key).is_some()).count() as i64,
            )),
            "INCRBY" => {
                let delta: i64 = args[1].parse().map_err(|_| not_integer())?;
                let current = match self.live(&args[0]).map(|entry| entry.data) {
                    None => 0,
                    Some(Data::Str(bytes)) => String::from_utf8_lossy(&bytes)
                        .parse::<i64>()
                        .map_err(|_| not_integer())?,
                    Some(Data::Hash(_)) => return Err(wrong_type()),
                };
                let next = current + delta;
                self.put_raw(&args[0], next.to_string().as_bytes());
                Ok(Value::Int(next))
            }
            "PTTL" => Ok(Value::Int(match self.live(&args[0]) {
                None => -2,
                Some(Entry {
                    expires_at: None, ..
                }) => -1,
                Some(Entry {
                    expires_at: Some(at),
                    ..
                }) => at.saturating_duration_since(Instant::now()).as_millis() as i64,
            })),
            "DEL" => Ok(Value::Int(
                args.iter()
                    .filter(|key| self.store.remove(key.as_str()).is_some())
                    .count() as i64,
            )),
            "KEYS" => {
                let mut keys: Vec<String> = self
                    .store
                    .iter()
                    .filter(|entry| entry.value().is_live() && glob_match(&args[0], entry.key()))
                    .map(|entry| entry.key().clone())
                    .collect();
                keys.sort();
                Ok(Value::Array(
                    keys.into_iter()
                        .map(|key| Value::BulkString(key.into_bytes()))
                        .collect(),
                ))
            }
            other => Err(RedisError::from((
                ErrorKind::ResponseError,
                "unknown command",
                other.to_owned(),
            ))),
        }
    }

    fn set(&self, args: &[String]) -> Result<Value, RedisError> {
        let key = args[0].clone();
        let mut nx = false;
        let mut expires_at = None;
        let mut options = args[2..].iter();
        while let Some(option) = options.next() {
            match option.to_uppercase().as_str() {
                "NX" => nx = true,
                "PX" => {
                    let millis: u64 = options
                        .next()
                        .and_then(|millis| millis.parse().ok())
                        .ok_or_else(not_integer)?;
                    expires_at = Some(Instant::now() + Duration::from_millis(millis));
                }
                _ => return Err((ErrorKind::ResponseError, "syntax error").into()),
            }
        }

        if nx && self.live(&key).is_some() {
            return Ok(Value::Nil);
        }
        self.store.insert(
            key,
            Entry {
                data: Data::Str(args[1].as_bytes().to_vec()),
                expires_at,
            },
        );
        Ok(Value::Okay)
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn topology(&self) -> Topology {
        self.topology
    }

    async fn query(&self, cmd: &Cmd) -> Result<Value, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let args = cmd
            .args_iter()
            .filter_map(|arg| match arg {
                Arg::Simple(bytes) => Some(bytes.to_vec()),
                Arg::Cursor => None,
            })
            .collect();
        Ok(self.execute(args)?)
    }
}

/// [`MockConnection`] with publish and subscribe support.
#[derive(Clone)]
pub struct PubSubMock {
    inner: MockConnection,
    sender: broadcast::Sender<Message>,
}

impl PubSubMock {
    pub fn new(inner: MockConnection) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { inner, sender }
    }

    fn subscription(&self, accept: impl Fn(&str) -> Option<Option<String>> + Send + 'static) -> Subscription {
        let receiver = self.sender.subscribe();
        let messages = stream::unfold((receiver, accept), |(mut receiver, accept)| async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if let Some(pattern) = accept(message.channel()) {
                            let message =
                                Message::new(message.channel(), pattern, message.payload());
                            return Some((message, (receiver, accept)));
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Subscription::from_stream(messages)
    }
}

#[async_trait]
impl Connection for PubSubMock {
    fn topology(&self) -> Topology {
        self.inner.topology()
    }

    async fn query(&self, cmd: &Cmd) -> Result<Value, Error> {
        self.inner.query(cmd).await
    }

    async fn publish(&self, channel: &str, message: &[u8]) -> Result<(), Error> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        // No subscribers is not an error for PUBLISH.
        let _ = self.sender.send(Message::new(channel, None, message));
        Ok(())
    }

    async fn subscribe(&self, channels: &[String]) -> Result<Subscription, Error> {
        let channels = channels.to_vec();
        Ok(self.subscription(move |channel| {
            channels.iter().any(|c| c == channel).then_some(None)
        }))
    }

    async fn psubscribe(&self, patterns: &[String]) -> Result<Subscription, Error> {
        let patterns = patterns.to_vec();
        Ok(self.subscription(move |channel| {
            patterns
                .iter()
                .find(|pattern| glob_match(pattern, channel))
                .map(|pattern| Some(pattern.clone()))
        }))
    }
}

fn wrong_type() -> RedisError {
    (
        ErrorKind::TypeError,
        "WRONGTYPE Operation against a key holding the wrong kind of value",
    )
        .into()
}

fn not_integer() -> RedisError {
    (
        ErrorKind::TypeError,
        "value is not an integer or out of range",
    )
        .into()
}

/// Glob matching with `*` and `?`, enough for `KEYS` in tests.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    fn matches(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                matches(&pattern[1..], text) || (!text.is_empty() && matches(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => matches(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if p == t => matches(&pattern[1..], &text[1..]),
            _ => false,
        }
    }
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches(&pattern, &text)
}
