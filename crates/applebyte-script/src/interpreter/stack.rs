//! Script execution stack.

use super::error::{InterpreterError, InterpreterErrorCode};
use super::scriptnum::ScriptNumber;

/// Convert byte array to boolean (Bitcoin consensus rules).
pub fn as_bool(t: &[u8]) -> bool {
    for i in 0..t.len() {
        if t[i] != 0 {
            // Negative 0 is also considered false
            if i == t.len() - 1 && t[i] == 0x80 {
                return false;
            }
            return true;
        }
    }
    false
}

/// Convert boolean to byte array.
pub fn from_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        vec![]
    }
}

fn underflow(needed: usize, depth: usize) -> InterpreterError {
    InterpreterError::new(
        InterpreterErrorCode::StackUnderflow,
        format!("operation needs {} items but the stack holds {}", needed, depth),
    )
}

/// The main data/alt stack used by the script interpreter.
///
/// Index 0 is the top of the stack.
pub struct Stack {
    stk: Vec<Vec<u8>>,
    max_num_length: usize,
    verify_minimal_data: bool,
}

impl Stack {
    pub fn new(max_num_length: usize, verify_minimal_data: bool) -> Self {
        Stack {
            stk: Vec::new(),
            max_num_length,
            verify_minimal_data,
        }
    }

    pub fn depth(&self) -> usize {
        self.stk.len()
    }

    pub fn push_byte_array(&mut self, data: Vec<u8>) {
        self.stk.push(data);
    }

    pub fn push_int(&mut self, n: ScriptNumber) {
        self.push_byte_array(n.to_bytes());
    }

    pub fn push_bool(&mut self, val: bool) {
        self.push_byte_array(from_bool(val));
    }

    pub fn pop_byte_array(&mut self) -> Result<Vec<u8>, InterpreterError> {
        self.nip_n(0)
    }

    pub fn pop_int(&mut self) -> Result<ScriptNumber, InterpreterError> {
        let data = self.pop_byte_array()?;
        ScriptNumber::from_bytes(&data, self.max_num_length, self.verify_minimal_data)
    }

    pub fn pop_bool(&mut self) -> Result<bool, InterpreterError> {
        let data = self.pop_byte_array()?;
        Ok(as_bool(&data))
    }

    pub fn peek_byte_array(&self, idx: usize) -> Result<&[u8], InterpreterError> {
        let sz = self.stk.len();
        if idx >= sz {
            return Err(underflow(idx + 1, sz));
        }
        Ok(&self.stk[sz - idx - 1])
    }

    /// Remove and return the item `idx` places below the top.
    pub fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>, InterpreterError> {
        let sz = self.stk.len();
        if idx >= sz {
            return Err(underflow(idx + 1, sz));
        }
        Ok(self.stk.remove(sz - idx - 1))
    }

    pub fn tuck(&mut self) -> Result<(), InterpreterError> {
        let so2 = self.pop_byte_array()?;
        let so1 = self.pop_byte_array()?;
        self.push_byte_array(so2.clone());
        self.push_byte_array(so1);
        self.push_byte_array(so2);
        Ok(())
    }

    pub fn drop_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        if self.stk.len() < n {
            return Err(underflow(n, self.stk.len()));
        }
        self.stk.truncate(self.stk.len() - n);
        Ok(())
    }

    /// Duplicate the top `n` items, keeping their order.
    pub fn dup_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let sz = self.stk.len();
        if sz < n {
            return Err(underflow(n, sz));
        }
        self.stk.extend_from_within(sz - n..);
        Ok(())
    }

    /// Move the `n` items below the top `2n` to the top.
    pub fn rot_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 3 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    /// Swap the top `n` items with the `n` below them.
    pub fn swap_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.nip_n(entry)?;
            self.push_byte_array(so);
        }
        Ok(())
    }

    /// Copy the `n` items below the top `n` to the top.
    pub fn over_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let entry = 2 * n - 1;
        for _ in 0..n {
            let so = self.peek_byte_array(entry)?.to_vec();
            self.push_byte_array(so);
        }
        Ok(())
    }

    pub fn pick_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.peek_byte_array(n)?.to_vec();
        self.push_byte_array(so);
        Ok(())
    }

    pub fn roll_n(&mut self, n: usize) -> Result<(), InterpreterError> {
        let so = self.nip_n(n)?;
        self.push_byte_array(so);
        Ok(())
    }

    /// Get stack contents as array (bottom to top).
    pub fn get_stack(&self) -> Vec<Vec<u8>> {
        self.stk.clone()
    }

    /// Set stack contents from array (last = top).
    pub fn set_stack(&mut self, data: Vec<Vec<u8>>) {
        self.stk = data;
    }

    pub fn clear(&mut self) {
        self.stk.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(items: &[&[u8]]) -> Stack {
        let mut s = Stack::new(4, false);
        for item in items {
            s.push_byte_array(item.to_vec());
        }
        s
    }

    #[test]
    fn test_as_bool() {
        assert!(!as_bool(&[]));
        assert!(!as_bool(&[0x00]));
        assert!(!as_bool(&[0x80])); // negative zero
        assert!(as_bool(&[0x01]));
        assert!(as_bool(&[0x00, 0x01]));
        assert!(!as_bool(&[0x00, 0x00]));
        assert!(!as_bool(&[0x00, 0x80])); // negative zero
        assert!(as_bool(&[0x80, 0x00]));
    }

    #[test]
    fn test_stack_basic_ops() {
        let mut s = stack_of(&[&[1, 2, 3], &[4, 5]]);
        assert_eq!(s.depth(), 2);
        assert_eq!(s.pop_byte_array().unwrap(), vec![4, 5]);
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn test_stack_dup() {
        let mut s = stack_of(&[&[1], &[2]]);
        s.dup_n(2).unwrap();
        assert_eq!(s.get_stack(), vec![vec![1], vec![2], vec![1], vec![2]]);
    }

    #[test]
    fn test_stack_swap_and_rot() {
        let mut s = stack_of(&[&[1], &[2]]);
        s.swap_n(1).unwrap();
        assert_eq!(s.get_stack(), vec![vec![2], vec![1]]);

        let mut s = stack_of(&[&[1], &[2], &[3]]);
        s.rot_n(1).unwrap();
        assert_eq!(s.get_stack(), vec![vec![2], vec![3], vec![1]]);

        let mut s = stack_of(&[&[1], &[2], &[3], &[4], &[5], &[6]]);
        s.rot_n(2).unwrap();
        assert_eq!(s.get_stack(), vec![vec![3], vec![4], vec![5], vec![6], vec![1], vec![2]]);
    }

    #[test]
    fn test_stack_over_pick_roll() {
        let mut s = stack_of(&[&[1], &[2], &[3], &[4]]);
        s.over_n(2).unwrap();
        assert_eq!(s.depth(), 6);
        assert_eq!(s.peek_byte_array(0).unwrap(), &[2]);
        assert_eq!(s.peek_byte_array(1).unwrap(), &[1]);

        let mut s = stack_of(&[&[1], &[2], &[3]]);
        s.pick_n(2).unwrap();
        assert_eq!(s.get_stack(), vec![vec![1], vec![2], vec![3], vec![1]]);
        s.roll_n(3).unwrap();
        assert_eq!(s.get_stack(), vec![vec![2], vec![3], vec![1], vec![1]]);
    }

    /// Every access past the bottom reports an underflow.
    #[test]
    fn test_underflow() {
        let mut s = stack_of(&[&[1]]);
        for err in [
            s.peek_byte_array(1).unwrap_err(),
            s.drop_n(2).unwrap_err(),
            s.dup_n(2).unwrap_err(),
            s.swap_n(1).unwrap_err(),
        ] {
            assert_eq!(err.code, InterpreterErrorCode::StackUnderflow);
        }
        assert_eq!(s.depth(), 1);
    }

    #[test]
    fn test_pop_int_respects_limits() {
        let mut s = Stack::new(4, true);
        s.push_byte_array(vec![1, 0, 0, 0, 0]);
        assert_eq!(s.pop_int().unwrap_err().code, InterpreterErrorCode::NumericOverflow);
        s.push_byte_array(vec![1, 0]);
        assert_eq!(s.pop_int().unwrap_err().code, InterpreterErrorCode::PolicyViolation);
    }
}
