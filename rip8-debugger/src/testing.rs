//! In-memory transport for unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::transport::{Transport, TransportError};

#[derive(Default)]
struct Script {
    bodies: HashMap<String, String>,
    offline: bool,
    reject_posts: bool,
    requests: Vec<String>,
}

/// Serves canned bodies and records every request as `"GET /path"` or
/// `"POST /path"`.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// A target with ramp memory and one body per channel.
    pub(crate) fn with_target(memory_len: usize, pc: u16) -> Self {
        let transport = Self::default();
        let memory: Vec<u8> = (0..memory_len).map(|address| address as u8).collect();
        transport.set_body("/registers", &format!(r#"{{"PC": {pc}, "v0": 255}}"#));
        transport.set_body(
            "/memory",
            &serde_json::to_string(&memory).expect("memory should encode"),
        );
        transport.set_body("/last-instruction", r#"{"JP": 512}"#);
        transport.set_body("/next-instruction", r#""CLS""#);
        transport.set_body("/last-drawn-sprite", "[160]");
        transport.set_body("/last-draw-area", "null");
        transport.set_body("/last-draw-result", "[255, 0]");
        transport
    }

    pub(crate) fn set_body(&self, path: &str, body: &str) {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.bodies.insert(path.to_string(), body.to_string());
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.script.lock().expect("script lock poisoned").offline = offline;
    }

    pub(crate) fn set_reject_posts(&self, reject: bool) {
        self.script.lock().expect("script lock poisoned").reject_posts = reject;
    }

    pub(crate) fn take_requests(&self) -> Vec<String> {
        std::mem::take(&mut self.script.lock().expect("script lock poisoned").requests)
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<String, TransportError> {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.requests.push(format!("GET {path}"));
        if script.offline {
            return Err(TransportError::Unreachable("target offline".to_string()));
        }
        script
            .bodies
            .get(path)
            .cloned()
            .ok_or(TransportError::Status(404))
    }

    async fn post(&self, path: &str) -> Result<(), TransportError> {
        let mut script = self.script.lock().expect("script lock poisoned");
        script.requests.push(format!("POST {path}"));
        if script.offline || script.reject_posts {
            return Err(TransportError::Status(500));
        }
        Ok(())
    }
}
