//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is built once, when a route is registered, and then
//! shared by every request on that route. The stage list is immutable after
//! [`PipelineBuilder::build`].
//!
//! Composition is done in one place ([`Next::run`]) by walking the stage
//! list front to back, so the first stage added is the outermost one.

use crate::middleware::{BoxedMiddleware, Middleware, Next};
use logcollector_core::{BoxFuture, Handler, Request, ResponseWriter};
use std::sync::Arc;

/// An ordered list of middleware stages in front of a terminal handler.
///
/// `Pipeline` itself implements [`Handler`], so pipelines nest: the server
/// wraps the route table (a handler) in its own CORS pipeline.
#[derive(Clone)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    endpoint: Arc<dyn Handler>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl Handler for Pipeline {
    fn serve<'a>(
        &'a self,
        w: &'a mut dyn ResponseWriter,
        request: &'a mut Request,
    ) -> BoxFuture<'a, ()> {
        Next::new(&self.stages, self.endpoint.as_ref()).run(w, request)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates a builder with no stages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Earlier stages wrap later ones.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn boxed_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Appends every stage in `stages`, keeping their order.
    #[must_use]
    pub fn stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        self.stages.extend(stages);
        self
    }

    /// Builds the pipeline around `endpoint`.
    #[must_use]
    pub fn build<H: Handler>(self, endpoint: H) -> Pipeline {
        self.build_shared(Arc::new(endpoint))
    }

    /// Builds the pipeline around an already shared endpoint.
    #[must_use]
    pub fn build_shared(self, endpoint: Arc<dyn Handler>) -> Pipeline {
        Pipeline {
            stages: self.stages,
            endpoint,
        }
    }
}
