//! The bounded stack machine.
//!
//! The stack behaves as if it sat on an infinite bed of zeros: popping empty
//! yields 0, pushing 0 onto emptiness is a no-op, and `rotate` pads with or
//! strips zeros at the bottom to keep that fiction consistent. Pushes past
//! `MAX_DEPTH` are silently dropped.

/// Maximum stack depth. Pushes beyond this are dropped.
pub const MAX_DEPTH: usize = 127;

/// Bounded stack of signed values; bottom at index 0, top at the end.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    values: Vec<i32>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { values: Vec::new() }
    }

    /// Build a pre-seeded stack, bottom first. Bottom zeros carry no
    /// information and are stripped; anything past `MAX_DEPTH` is dropped.
    pub fn from_seed(seed: &[i32]) -> Self {
        let start = seed.iter().position(|&v| v != 0).unwrap_or(seed.len());
        let mut values: Vec<i32> = seed[start..].to_vec();
        values.truncate(MAX_DEPTH);
        Stack { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Pop the top value; 0 if the stack is empty.
    pub fn pop(&mut self) -> i32 {
        self.values.pop().unwrap_or(0)
    }

    /// Push a value. Pushing 0 onto an empty stack is a no-op, so an absent
    /// value stays physically absent.
    pub fn push(&mut self, v: i32) {
        if v == 0 && self.values.is_empty() {
            return;
        }
        if self.values.len() >= MAX_DEPTH {
            return;
        }
        self.values.push(v);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn dup(&mut self) {
        let v = self.pop();
        self.push(v);
        self.push(v);
    }

    pub fn swap(&mut self) {
        let b = self.pop();
        let a = self.pop();
        self.push(b);
        self.push(a);
    }

    /// Signed stack rotation. Pops the count `n` itself, then:
    ///
    /// - `n >= 0`: bring the element `n` below the top up to the top. Past
    ///   the bottom it degrades to pushing an implicit 0; rotating the very
    ///   bottom element strips any zeros newly exposed at the bottom.
    /// - `n < 0`: demote the top to depth `|n|`, padding the bottom with
    ///   zeros when `|n|` reaches past the physical bottom.
    pub fn rotate(&mut self) {
        let by = self.pop();
        if self.values.is_empty() {
            return;
        }

        if by >= 0 {
            let by = by as usize;
            let depth = self.values.len();
            if by >= depth {
                self.push(0);
                return;
            }
            let rotated = self.values.remove(depth - 1 - by);
            self.push(rotated);
            if by + 1 == depth {
                // The old bottom moved up; zeros under the new bottom are
                // indistinguishable from the implicit bed, drop them.
                while self.values.first() == Some(&0) {
                    self.values.remove(0);
                }
            }
        } else {
            let m = by.unsigned_abs() as usize;
            let rotated = self.pop();
            let depth = self.values.len();
            if m >= depth {
                let pad = (m - depth).min(MAX_DEPTH.saturating_sub(depth + 1));
                let mut rebuilt = Vec::with_capacity(depth + pad + 1);
                rebuilt.push(rotated);
                rebuilt.resize(pad + 1, 0);
                rebuilt.append(&mut self.values);
                self.values = rebuilt;
            } else {
                self.values.insert(depth - m, rotated);
            }
        }
    }
}
