use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chalani::auth::TokenSigner;
use chalani::store::Store;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared handles injected into every handler via `Extension`.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<Store>,
    pub(crate) signer: Arc<TokenSigner>,
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}
