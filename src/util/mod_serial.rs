// Copyright (c) 2024 Mike Tsao. All rights reserved.

use derivative::Derivative;

/// [ModSerial] is a simple counter that lets us inform subscribers that
/// something has changed. Subscribers should keep a usize and compare to see
/// whether it differs from the one that we're currently reporting. If it does,
/// then they should update it and deal with the change.
#[derive(Clone, Copy, Debug, Derivative, PartialEq, Eq)]
#[derivative(Default)]
pub struct ModSerial(
    // We start at something other than usize::default() so that
    // everyone else can use the default value and fire their update
    // code on the first call to has_changed().
    #[derivative(Default(value = "1000"))] pub usize,
);
impl ModSerial {
    /// Records that something changed.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Reports whether the serial moved since `last_known`, and brings
    /// `last_known` up to date.
    pub fn has_changed(&self, last_known: &mut usize) -> bool {
        let has_changed = self.0 != *last_known;
        *last_known = self.0;
        has_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_check_reports_change() {
        let mut serial = ModSerial::default();
        let mut last_known = usize::default();
        assert!(serial.has_changed(&mut last_known));
        assert!(!serial.has_changed(&mut last_known));
        serial.bump();
        assert!(serial.has_changed(&mut last_known));
        assert!(!serial.has_changed(&mut last_known));
    }
}
