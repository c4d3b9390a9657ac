//! Handler shapes a module can export, and the uniform record they resolve to.
//!
//! A module is one of three shapes:
//! - a single function (served as `GET`)
//! - a table of per-method functions
//! - a constructible [`Resource`], instantiated once with the router handle,
//!   whose bound methods form the table
//!
//! The shape is an enum ([`Export`]) resolved once by
//! [`normalize`](crate::handler::normalize::normalize); nothing at request
//! time looks at it again.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::handler::method::MethodTag;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiResponse, HandlerResult};
use crate::routing::RouterHandle;

pub type HandlerFuture = BoxFuture<'static, HandlerResult>;

/// A callable bound to one method of one route.
pub type Handler = Arc<dyn Fn(ApiRequest, ApiResponse) -> HandlerFuture + Send + Sync>;

/// Boxes an async function into a [`Handler`].
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |req, res| f(req, res).boxed())
}

/// Per-method handlers, as exported by a module.
#[derive(Clone, Default)]
pub struct MethodTable {
    handlers: BTreeMap<MethodTag, Handler>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: MethodTag, handler: Handler) {
        self.handlers.insert(tag, handler);
    }

    pub fn on<F, Fut>(mut self, tag: MethodTag, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.insert(tag, handler_fn(f));
        self
    }

    pub fn all<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::All, f)
    }

    pub fn get<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Get, f)
    }

    pub fn post<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Post, f)
    }

    pub fn put<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Put, f)
    }

    pub fn patch<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Patch, f)
    }

    pub fn delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Delete, f)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn tags(&self) -> Vec<MethodTag> {
        self.handlers.keys().copied().collect()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// A module's handlers after normalization. Never empty.
#[derive(Clone)]
pub struct HandlerRecord {
    handlers: BTreeMap<MethodTag, Handler>,
}

impl HandlerRecord {
    /// `None` when the table has no method at all.
    pub fn from_table(table: MethodTable) -> Option<Self> {
        if table.is_empty() {
            None
        } else {
            Some(Self {
                handlers: table.handlers,
            })
        }
    }

    /// Methods in registration order.
    pub fn methods(&self) -> Vec<MethodTag> {
        self.handlers.keys().copied().collect()
    }

    pub fn handler(&self, tag: MethodTag) -> Option<&Handler> {
        self.handlers.get(&tag)
    }
}

impl IntoIterator for HandlerRecord {
    type Item = (MethodTag, Handler);
    type IntoIter = std::collections::btree_map::IntoIter<MethodTag, Handler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.into_iter()
    }
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("methods", &self.methods())
            .finish()
    }
}

/// A handler type built once at discovery and shared by every request.
///
/// State kept on the instance persists across requests and is shared between
/// concurrent ones; guard it with atomics or locks.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use convention_router::handler::{Resource, ResourceMethods};
/// use convention_router::http::{ApiRequest, ApiResponse, HandlerResult, Reply};
/// use convention_router::routing::RouterHandle;
///
/// struct Counter {
///     hits: AtomicU64,
/// }
///
/// impl Counter {
///     async fn get(self: Arc<Self>, _req: ApiRequest, _res: ApiResponse) -> HandlerResult {
///         Ok(Reply::success(self.hits.fetch_add(1, Ordering::SeqCst)))
///     }
/// }
///
/// impl Resource for Counter {
///     fn construct(_router: RouterHandle) -> Self {
///         Counter { hits: AtomicU64::new(0) }
///     }
///
///     fn bind(methods: ResourceMethods<Self>) -> ResourceMethods<Self> {
///         methods.get(Self::get)
///     }
/// }
/// ```
pub trait Resource: Send + Sync + Sized + 'static {
    /// Builds the single instance. The handle resolves once discovery is done.
    fn construct(router: RouterHandle) -> Self;

    /// Declares which methods the instance serves.
    fn bind(methods: ResourceMethods<Self>) -> ResourceMethods<Self>;
}

/// Binds methods of a shared instance into a [`MethodTable`].
pub struct ResourceMethods<T> {
    instance: Arc<T>,
    table: MethodTable,
}

impl<T: Send + Sync + 'static> ResourceMethods<T> {
    pub fn new(instance: Arc<T>) -> Self {
        Self {
            instance,
            table: MethodTable::new(),
        }
    }

    pub fn instance(&self) -> &Arc<T> {
        &self.instance
    }

    pub fn on<F, Fut>(mut self, tag: MethodTag, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let instance = Arc::clone(&self.instance);
        self.table
            .insert(tag, handler_fn(move |req, res| f(Arc::clone(&instance), req, res)));
        self
    }

    pub fn all<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::All, f)
    }

    pub fn get<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Get, f)
    }

    pub fn post<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Post, f)
    }

    pub fn put<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Put, f)
    }

    pub fn patch<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Patch, f)
    }

    pub fn delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<T>, ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.on(MethodTag::Delete, f)
    }

    pub fn into_table(self) -> MethodTable {
        self.table
    }
}

/// Builds a resource instance and returns its bound methods.
pub type Constructor = Box<dyn FnOnce(RouterHandle) -> MethodTable + Send>;

/// The shape of a module's export.
pub enum Export {
    /// A single function, served as `GET`.
    Function(Handler),
    /// Per-method functions.
    Table(MethodTable),
    /// A resource type, instantiated once.
    Constructor(Constructor),
}

impl Export {
    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Export::Function(handler_fn(f))
    }

    pub fn resource<T: Resource>() -> Self {
        Export::Constructor(Box::new(|router| {
            let instance = Arc::new(T::construct(router));
            T::bind(ResourceMethods::new(instance)).into_table()
        }))
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Function(_) => f.write_str("Export::Function"),
            Export::Table(table) => f.debug_tuple("Export::Table").field(table).finish(),
            Export::Constructor(_) => f.write_str("Export::Constructor"),
        }
    }
}

/// What loading a module yields: an optional default export plus named
/// per-method exports. The default export wins when present.
#[derive(Debug, Default)]
pub struct LoadedModule {
    pub default: Option<Export>,
    pub named: MethodTable,
}

impl LoadedModule {
    /// A module with only named per-method exports.
    pub fn named(table: MethodTable) -> Self {
        Self {
            default: None,
            named: table,
        }
    }

    /// A module whose default export is `export`.
    pub fn default_export(export: Export) -> Self {
        Self {
            default: Some(export),
            named: MethodTable::new(),
        }
    }

    /// A module whose default export is a single `GET` function.
    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(ApiRequest, ApiResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::default_export(Export::function(f))
    }

    /// A module whose default export is the resource type `T`.
    pub fn resource<T: Resource>() -> Self {
        Self::default_export(Export::resource::<T>())
    }

    pub fn with_default(mut self, export: Export) -> Self {
        self.default = Some(export);
        self
    }
}
