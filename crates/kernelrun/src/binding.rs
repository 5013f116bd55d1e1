//! Argument binding state for the current launch cycle.

use kernelrun_core::types::KernelId;

/// The active kernel handle and the auto-incrementing slot cursor.
///
/// Both are reset together, at launch time only: the next bind after a
/// launch re-resolves a kernel and starts from slot 0.
#[derive(Default)]
pub(crate) struct BindState {
    /// Currently selected kernel, if a bind cycle is in progress.
    pub(crate) active: Option<KernelId>,
    /// Next argument slot to fill.
    pub(crate) cursor: usize,
}

impl BindState {
    pub(crate) fn reset(&mut self) {
        self.active = None;
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_clears_both() {
        let mut bind = BindState {
            active: Some(KernelId::new(3)),
            cursor: 5,
        };
        bind.reset();
        assert!(bind.active.is_none());
        assert_eq!(bind.cursor, 0);
    }
}
