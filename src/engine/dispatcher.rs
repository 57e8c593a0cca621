//! SE-020: Operation dispatch.
//!
//! Parses the operation name, checks required parameters, routes to the
//! operation and folds every failure into an `OperationResult`. Nothing
//! escapes `dispatch` as an error or a panic path.

use super::ops::{animation, project, resource, scene, script, Context};
use super::params::Params;
use crate::core::error::OpError;
use crate::core::types::{Operation, OperationRequest, OperationResult};
use std::path::Path;

pub struct Dispatcher {
    ctx: Context,
}

impl Dispatcher {
    pub fn new(project_root: &Path) -> Self {
        Self {
            ctx: Context::new(project_root),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn dispatch(&self, request: &OperationRequest) -> OperationResult {
        match self.try_dispatch(request) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("{} failed ({}): {}", request.operation, e.kind(), e);
                e.into()
            }
        }
    }

    fn try_dispatch(&self, request: &OperationRequest) -> Result<OperationResult, OpError> {
        let op: Operation = request.operation.parse()?;
        let params = Params::new(&request.params);
        params.check_required(op.required_params())?;
        log::debug!("dispatching {}", op);
        self.run(op, &params)
    }

    fn run(&self, op: Operation, params: &Params) -> Result<OperationResult, OpError> {
        let ctx = &self.ctx;
        match op {
            Operation::CreateScene => scene::create_scene(ctx, params),
            Operation::AddNode => scene::add_node(ctx, params),
            Operation::RemoveNode => scene::remove_node(ctx, params),
            Operation::ModifyNode => scene::modify_node(ctx, params),
            Operation::ReadScene => scene::read_scene(ctx, params),
            Operation::ListNodes => scene::list_nodes(ctx, params),
            Operation::CreateScript => script::create_script(ctx, params),
            Operation::AttachScript => script::attach_script(ctx, params),
            Operation::CreateAnimation => animation::create_animation(ctx, params),
            Operation::AddAnimationTrack => animation::add_animation_track(ctx, params),
            Operation::CreateResource => resource::create_resource(ctx, params),
            Operation::GetProjectInfo => project::get_project_info(ctx, params),
            Operation::ListScenes => project::list_scenes(ctx, params),
            Operation::ListScripts => project::list_scripts(ctx, params),
        }
    }
}
