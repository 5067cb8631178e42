//! Tile loading primitives
//!
//! A [`TileLoader`] starts fetching a tile URL and reports completion exactly
//! once on the channel it is handed. Loaders never block the caller; the map
//! drains completions on its own thread.

use crossbeam_channel::Sender;
use once_cell::sync::Lazy;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::geo::TileCoord;
use crate::{MapError, Result};

const USER_AGENT: &str = concat!("tinymap/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared blocking HTTP client with a custom User-Agent so that public tile
/// servers don't reject the request. Building the client once avoids the
/// cost of TLS and connection pool setup for every tile.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::blocking::Client> = Lazy::new(|| {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("failed to build reqwest blocking client")
});

/// A single tile fetch handed to a loader
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub coord: TileCoord,
    pub url: String,
    removed: Arc<AtomicBool>,
}

impl TileRequest {
    pub fn new(coord: TileCoord, url: impl Into<String>, removed: Arc<AtomicBool>) -> Self {
        Self {
            coord,
            url: url.into(),
            removed,
        }
    }

    /// True once the owning map has been removed. The result will be
    /// discarded, so loaders may skip delivering it.
    pub fn is_abandoned(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

/// Result of a tile loading operation
#[derive(Debug)]
pub struct TileResponse {
    pub coord: TileCoord,
    pub data: Result<Vec<u8>>,
}

/// Anything that can fetch tile bytes and signal completion
pub trait TileLoader {
    /// Start loading `request`. Must not block; exactly one response is sent
    /// on `done` unless the request is abandoned first.
    fn load(&self, request: TileRequest, done: Sender<TileResponse>);
}

/// Protocol-relative templates (`//host/...`) are common in web maps; fetch
/// them over https.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

fn deliver(request: &TileRequest, data: Result<Vec<u8>>, done: &Sender<TileResponse>) {
    if request.is_abandoned() {
        log::debug!("dropping tile {:?}, map was removed", request.coord);
        return;
    }

    // The map may already be gone; nothing is waiting then
    let _ = done.send(TileResponse {
        coord: request.coord,
        data,
    });
}

/// Fetches every tile on its own detached thread with a blocking client
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTileLoader;

impl HttpTileLoader {
    pub fn new() -> Self {
        Self
    }

    fn fetch(url: &str) -> Result<Vec<u8>> {
        let resp = HTTP_CLIENT.get(normalize_url(url)).send()?;
        if !resp.status().is_success() {
            return Err(MapError::Http(format!("HTTP {} for {}", resp.status(), url)));
        }
        Ok(resp.bytes()?.to_vec())
    }
}

impl TileLoader for HttpTileLoader {
    fn load(&self, request: TileRequest, done: Sender<TileResponse>) {
        thread::spawn(move || {
            log::debug!("fetch tile {:?} from {}", request.coord, request.url);
            let data = Self::fetch(&request.url);
            match &data {
                Ok(bytes) => {
                    log::debug!("downloaded tile {:?} ({} bytes)", request.coord, bytes.len())
                }
                Err(e) => log::warn!("tile {:?} download failed: {}", request.coord, e),
            }
            deliver(&request, data, &done);
        });
    }
}

#[cfg(feature = "tokio-runtime")]
pub use self::tokio_impl::TokioTileLoader;

#[cfg(feature = "tokio-runtime")]
mod tokio_impl {
    use super::*;
    use tokio::runtime::Handle;

    /// Shared async HTTP client for tile fetching
    static ASYNC_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(16)
            .build()
            .expect("failed to build reqwest async client")
    });

    /// Fetches tiles as tasks on a tokio runtime
    #[derive(Debug, Clone)]
    pub struct TokioTileLoader {
        handle: Handle,
    }

    impl TokioTileLoader {
        pub fn new(handle: Handle) -> Self {
            Self { handle }
        }

        /// Loader bound to the runtime of the calling context.
        /// Panics outside a tokio runtime, like `Handle::current`.
        pub fn current() -> Self {
            Self::new(Handle::current())
        }

        async fn fetch(url: String) -> Result<Vec<u8>> {
            let resp = ASYNC_CLIENT.get(normalize_url(&url)).send().await?;
            if !resp.status().is_success() {
                return Err(MapError::Http(format!("HTTP {} for {}", resp.status(), url)));
            }
            Ok(resp.bytes().await?.to_vec())
        }
    }

    impl TileLoader for TokioTileLoader {
        fn load(&self, request: TileRequest, done: Sender<TileResponse>) {
            self.handle.spawn(async move {
                log::debug!("fetch tile {:?} from {}", request.coord, request.url);
                let data = Self::fetch(request.url.clone()).await;
                if let Err(e) = &data {
                    log::warn!("tile {:?} download failed: {}", request.coord, e);
                }
                deliver(&request, data, &done);
            });
        }
    }
}

/// Loader driven by hand: requests are recorded and completed explicitly,
/// in any order. Useful for headless rendering and tests.
#[derive(Debug, Default)]
pub struct ManualTileLoader {
    pending: RefCell<Vec<(TileRequest, Sender<TileResponse>)>>,
    issued: RefCell<Vec<TileRequest>>,
}

impl ManualTileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request ever issued, in issue order
    pub fn requests(&self) -> Vec<TileRequest> {
        self.issued.borrow().clone()
    }

    /// Number of requests not yet completed
    pub fn outstanding(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Complete the request for `coord` with `data`. Returns false if no such
    /// request is outstanding.
    pub fn complete(&self, coord: TileCoord, data: Vec<u8>) -> bool {
        self.resolve(coord, Ok(data))
    }

    /// Fail the request for `coord`
    pub fn fail(&self, coord: TileCoord, reason: &str) -> bool {
        self.resolve(coord, Err(MapError::Http(reason.to_string())))
    }

    /// Complete every outstanding request with a copy of `data`, in issue order
    pub fn complete_all(&self, data: &[u8]) -> usize {
        let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        let count = pending.len();
        for (request, done) in pending {
            deliver(&request, Ok(data.to_vec()), &done);
        }
        count
    }

    fn resolve(&self, coord: TileCoord, data: Result<Vec<u8>>) -> bool {
        let entry = {
            let mut pending = self.pending.borrow_mut();
            let idx = pending.iter().position(|(request, _)| request.coord == coord);
            idx.map(|idx| pending.remove(idx))
        };

        match entry {
            Some((request, done)) => {
                deliver(&request, data, &done);
                true
            }
            None => false,
        }
    }
}

impl TileLoader for ManualTileLoader {
    fn load(&self, request: TileRequest, done: Sender<TileResponse>) {
        self.issued.borrow_mut().push(request.clone());
        self.pending.borrow_mut().push((request, done));
    }
}
