//! Common test utilities and helpers for the photobooth tests
//!
//! This module provides scripted providers, test images and a tiny HTTP stub
//! so the compositor, session and OpenAI client can be tested offline.

#![allow(dead_code)]

/// Test images with known pixel values
pub mod test_images {
    use photobooth::RasterImage;

    pub const RED: [u8; 4] = [255, 0, 0, 255];
    pub const GREEN: [u8; 4] = [0, 255, 0, 255];
    pub const BLUE: [u8; 4] = [0, 0, 255, 255];
    pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

    /// Opaque image of one color.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RasterImage {
        let rgba = color.repeat((width * height) as usize);
        RasterImage::from_rgba(width, height, rgba).unwrap()
    }

    /// Opaque square whose pixels encode their own column: `[x, y, 128, 255]`.
    pub fn gradient(side: u32) -> RasterImage {
        let mut rgba = Vec::with_capacity((side * side * 4) as usize);
        for y in 0..side {
            for x in 0..side {
                rgba.extend_from_slice(&[x as u8, y as u8, 128, 255]);
            }
        }
        RasterImage::from_rgba(side, side, rgba).unwrap()
    }

    pub fn solid_png(side: u32, color: [u8; 4]) -> Vec<u8> {
        solid(side, side, color).encode_png().unwrap()
    }
}

/// Scripted in-memory providers
pub mod mock_provider {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use photobooth::compositor::FillSide;
    use photobooth::{
        BoothError, BoothResult, FillRequest, FillResponse, ImageFillProvider, ImageGenerator,
        PromptEnhancer, RasterImage,
    };
    use tokio::sync::Barrier;

    use super::test_images::{solid_png, BLUE, GREEN};

    /// Fill provider that answers each crop with a solid square.
    ///
    /// The side is recognised from the crop itself: the left crop starts with
    /// transparent padding, the right crop ends with it.
    pub struct ScriptedFill {
        pub left_color: [u8; 4],
        pub right_color: [u8; 4],
        pub left_delay: Duration,
        pub right_delay: Duration,
        pub fail_side: Option<FillSide>,
        /// Side of the returned square; defaults to the requested size
        pub reply_size: Option<u32>,
        /// Both calls must reach the barrier before either returns
        pub barrier: Option<Arc<Barrier>>,
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<FillRequest>>,
    }

    impl Default for ScriptedFill {
        fn default() -> Self {
            Self {
                left_color: GREEN,
                right_color: BLUE,
                left_delay: Duration::ZERO,
                right_delay: Duration::ZERO,
                fail_side: None,
                reply_size: None,
                barrier: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ScriptedFill {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<FillRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    /// Which slot a crop was cut from.
    pub fn side_of(request: &FillRequest) -> FillSide {
        let crop = RasterImage::decode(&request.image_png).unwrap();
        if crop.pixel(0, 0)[3] == 0 {
            FillSide::Left
        } else {
            FillSide::Right
        }
    }

    #[async_trait]
    impl ImageFillProvider for ScriptedFill {
        async fn fill(&self, request: FillRequest) -> BoothResult<FillResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let side = side_of(&request);
            let size = self.reply_size.unwrap_or(request.size);
            self.requests.lock().unwrap().push(request);

            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            let (delay, color) = match side {
                FillSide::Left => (self.left_delay, self.left_color),
                FillSide::Right => (self.right_delay, self.right_color),
            };
            tokio::time::sleep(delay).await;

            if self.fail_side == Some(side) {
                return Err(BoothError::provider(
                    "scripted",
                    side.operation(),
                    Some(500),
                    "scripted failure",
                ));
            }
            Ok(FillResponse {
                image_bytes: solid_png(size, color),
            })
        }
    }

    /// Generator returning a solid square of the requested size.
    pub struct ScriptedGenerator {
        pub color: [u8; 4],
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(color: [u8; 4]) -> Self {
            Self {
                color,
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str, size: u32) -> BoothResult<Vec<u8>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(solid_png(size, self.color))
        }
    }

    /// Enhancer that prefixes the prompt, or fails when `fail` is set.
    #[derive(Default)]
    pub struct ScriptedEnhancer {
        pub fail: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PromptEnhancer for ScriptedEnhancer {
        async fn enhance(&self, prompt: &str) -> BoothResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(BoothError::provider(
                    "scripted",
                    "chat_completion",
                    Some(503),
                    "overloaded",
                ));
            }
            Ok(format!("Vivid: {}", prompt))
        }
    }
}

/// Minimal HTTP/1.1 server answering canned responses in order
pub mod http_stub {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        pub fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap()
        }
    }

    #[derive(Debug, Clone)]
    pub enum Reply {
        Json(u16, String),
        /// Accept the request and never answer
        Hang,
    }

    pub struct StubServer {
        pub base: String,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl StubServer {
        /// Serve `replies` in order, one per connection; later connections get a 500.
        pub async fn start(replies: Vec<Reply>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}/v1", listener.local_addr().unwrap());
            let requests = Arc::new(Mutex::new(Vec::new()));
            let replies = Arc::new(Mutex::new(VecDeque::from(replies)));

            let recorded = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let reply = replies
                        .lock()
                        .unwrap()
                        .pop_front()
                        .unwrap_or_else(|| Reply::Json(500, "{}".to_string()));
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        handle(stream, reply, recorded).await;
                    });
                }
            });

            Self { base, requests }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn handle(
        mut stream: TcpStream,
        reply: Reply,
        recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    ) {
        let Some(request) = read_request(&mut stream).await else {
            return;
        };
        recorded.lock().unwrap().push(request);

        match reply {
            Reply::Json(status, body) => {
                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
        }
    }

    async fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];

        let header_end = loop {
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let mut lines = head.split("\r\n");
        let request_line = lines.next()?.to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok());
        let mut body = buf[header_end + 4..].to_vec();

        match content_length {
            Some(len) => {
                while body.len() < len {
                    let n = stream.read(&mut chunk).await.ok()?;
                    if n == 0 {
                        break;
                    }
                    body.extend_from_slice(&chunk[..n]);
                }
            }
            None => {
                // chunked: keep the raw framing, tests only search the text
                while find(&body, b"0\r\n\r\n").is_none() {
                    let n = stream.read(&mut chunk).await.ok()?;
                    if n == 0 {
                        break;
                    }
                    body.extend_from_slice(&chunk[..n]);
                }
            }
        }

        Some(RecordedRequest {
            request_line,
            headers,
            body,
        })
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
