//! Per-thread resolution path tracking.
//!
//! Every resolution pushes a frame onto a thread-local stack for the
//! duration of the call. The stack gives error paths, detects prototype
//! cycles (which no early reference can break) and bounds the recursion
//! depth. Depends-on cycles are found over declared edges instead; see
//! `dependents`.

use std::cell::RefCell;

use crate::error::{BeanError, BeanResult};

thread_local! {
    static RESOLUTION_TLS: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Singleton,
    Prototype,
}

struct Frame {
    factory: usize,
    name: String,
    kind: FrameKind,
}

/// RAII guard for one frame on the current thread's resolution path.
pub(crate) struct ResolutionFrame {
    depth: usize,
}

impl ResolutionFrame {
    pub(crate) fn enter(factory: usize, name: &str, kind: FrameKind, max_depth: usize) -> BeanResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut stack = tls.borrow_mut();

            // Singleton re-entry is legal; the singleton registry decides
            // whether an early reference can satisfy it.
            if kind != FrameKind::Singleton
                && stack
                    .iter()
                    .any(|f| f.factory == factory && f.kind == kind && f.name == name)
            {
                let mut path = names_on_path(&stack, factory);
                if path.last().map(String::as_str) != Some(name) {
                    path.push(name.to_string());
                }
                return Err(BeanError::CircularDependencyUnresolvable { path });
            }

            if stack.len() >= max_depth {
                return Err(BeanError::DepthExceeded(stack.len()));
            }

            stack.push(Frame {
                factory,
                name: name.to_string(),
                kind,
            });
            Ok(Self { depth: stack.len() })
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().truncate(self.depth - 1);
        });
    }
}

fn names_on_path(stack: &[Frame], factory: usize) -> Vec<String> {
    stack
        .iter()
        .filter(|f| f.factory == factory)
        .map(|f| f.name.clone())
        .collect()
}

/// Names being resolved by `factory` on this thread, outermost first, with
/// `name` appended.
pub(crate) fn path_to(factory: usize, name: &str) -> Vec<String> {
    RESOLUTION_TLS.with(|tls| {
        let stack = tls.borrow();
        let mut path = names_on_path(&stack, factory);
        if path.last().map(String::as_str) != Some(name) {
            path.push(name.to_string());
        }
        path
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_pop_on_drop() {
        {
            let _a = ResolutionFrame::enter(1, "a", FrameKind::Singleton, 8).unwrap();
            let _b = ResolutionFrame::enter(1, "b", FrameKind::Singleton, 8).unwrap();
            assert_eq!(path_to(1, "c"), vec!["a", "b", "c"]);
        }
        assert_eq!(path_to(1, "c"), vec!["c"]);
    }

    #[test]
    fn prototype_reentry_is_circular() {
        let _a = ResolutionFrame::enter(2, "p", FrameKind::Prototype, 8).unwrap();
        let _b = ResolutionFrame::enter(2, "q", FrameKind::Prototype, 8).unwrap();
        match ResolutionFrame::enter(2, "p", FrameKind::Prototype, 8) {
            Err(BeanError::CircularDependencyUnresolvable { path }) => {
                assert_eq!(path, vec!["p", "q", "p"]);
            }
            _ => panic!("expected circular error"),
        }
    }

    #[test]
    fn frames_of_other_factories_do_not_collide() {
        let _a = ResolutionFrame::enter(3, "p", FrameKind::Prototype, 8).unwrap();
        assert!(ResolutionFrame::enter(4, "p", FrameKind::Prototype, 8).is_ok());
    }

    #[test]
    fn depth_is_bounded() {
        let _a = ResolutionFrame::enter(5, "a", FrameKind::Singleton, 2).unwrap();
        let _b = ResolutionFrame::enter(5, "b", FrameKind::Singleton, 2).unwrap();
        assert!(matches!(
            ResolutionFrame::enter(5, "c", FrameKind::Singleton, 2),
            Err(BeanError::DepthExceeded(2))
        ));
    }
}
