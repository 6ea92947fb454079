//! The ambient render context
//!
//! Each thread carries one global [`RenderContext`] that deferred values
//! resolve against. It starts out as [`RenderContext::global`] and can be
//! swapped for the duration of a closure with [`with_context`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::{RenderContext, Scope};
use crate::error::{ContextError, ContextResult};

thread_local! {
    static AMBIENT: RefCell<Rc<RenderContext>> = RefCell::new(Rc::new(RenderContext::global()));
}

/// The context deferred values currently resolve against
pub fn current() -> Rc<RenderContext> {
    AMBIENT.with(|slot| Rc::clone(&slot.borrow()))
}

/// Install `ctx` as the ambient context, returning the previous one
pub fn replace(ctx: RenderContext) -> ContextResult<Rc<RenderContext>> {
    check_global(&ctx)?;
    Ok(swap(Rc::new(ctx)))
}

/// Restore the built-in global defaults
pub fn reset() {
    swap(Rc::new(RenderContext::global()));
}

/// Run `f` with `ctx` as the ambient context
///
/// The previous context is restored when `f` returns or unwinds.
pub fn with_context<R>(ctx: RenderContext, f: impl FnOnce() -> R) -> ContextResult<R> {
    check_global(&ctx)?;
    let _guard = RestoreGuard {
        previous: Some(swap(Rc::new(ctx))),
    };
    Ok(f())
}

fn check_global(ctx: &RenderContext) -> ContextResult<()> {
    if ctx.scope() != Scope::Global {
        return Err(ContextError::ScopeMismatch {
            expected: Scope::Global,
            actual: ctx.scope(),
        });
    }
    Ok(())
}

fn swap(ctx: Rc<RenderContext>) -> Rc<RenderContext> {
    AMBIENT.with(|slot| slot.replace(ctx))
}

struct RestoreGuard {
    previous: Option<Rc<RenderContext>>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            // The slot may already be gone during thread teardown
            let _ = AMBIENT.try_with(|slot| slot.replace(previous));
        }
    }
}
