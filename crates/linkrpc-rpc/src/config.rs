use linkrpc_frame::{FrameConfig, RPC};

/// RPC layer configuration.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Frame type carrying RPC messages. Default: 8.
    pub frame_type: u16,
    /// Framing limits for calls sent and frames received.
    pub frame: FrameConfig,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            frame_type: RPC,
            frame: FrameConfig::default(),
        }
    }
}

impl RpcConfig {
    pub fn with_frame_type(mut self, frame_type: u16) -> Self {
        self.frame_type = frame_type;
        self
    }

    pub fn with_frame_config(mut self, frame: FrameConfig) -> Self {
        self.frame = frame;
        self
    }
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rpc: RpcConfig,
    /// Name given to the reader thread.
    pub thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            thread_name: "linkrpc-reader".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_rpc_config(mut self, rpc: RpcConfig) -> Self {
        self.rpc = rpc;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
