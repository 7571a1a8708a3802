use crate::config::{CallLogConfig, CallLogConfigBuilder};
use crate::CallLog;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that logs each call before it starts.
///
/// # Examples
///
/// ```
/// use tower_query_log::CallLogLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(CallLogLayer::new(|query: &String| query.clone()))
///     .service(tower::service_fn(|query: String| async move {
///         Ok::<_, std::io::Error>(query.len())
///     }));
/// ```
pub struct CallLogLayer<Req> {
    config: Arc<CallLogConfig<Req>>,
}

impl<Req> Clone for CallLogLayer<Req> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<Req> CallLogLayer<Req> {
    /// Creates an unnamed logger writing the key produced by `request_key`.
    pub fn new<F>(request_key: F) -> Self
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        Self::builder(request_key).build()
    }

    /// Creates a builder for configuring a logger.
    pub fn builder<F>(request_key: F) -> CallLogConfigBuilder<Req>
    where
        F: Fn(&Req) -> String + Send + Sync + 'static,
    {
        CallLogConfigBuilder::new(request_key)
    }

    pub(crate) fn from_config(config: CallLogConfig<Req>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Records a call for `request` without wrapping a service.
    pub fn log_before_call(&self, request: &Req) {
        crate::record(&self.config, &crate::request_key(&self.config, request));
    }
}

impl<S, Req> Layer<S> for CallLogLayer<Req> {
    type Service = CallLog<S, Req>;

    fn layer(&self, service: S) -> Self::Service {
        CallLog::new(service, Arc::clone(&self.config))
    }
}
