//! Memory operands as a host reports them.

use mtrace_usf::AccessKind;

/// One memory operand of an executed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemOperand {
    /// Effective virtual address.
    pub addr: u64,
    /// Access width in bytes.
    pub len: u16,
    pub is_read: bool,
    pub is_write: bool,
}

impl MemOperand {
    #[must_use]
    pub const fn read(addr: u64, len: u16) -> Self {
        Self {
            addr,
            len,
            is_read: true,
            is_write: false,
        }
    }

    #[must_use]
    pub const fn write(addr: u64, len: u16) -> Self {
        Self {
            addr,
            len,
            is_read: false,
            is_write: true,
        }
    }

    /// Operand both read and written in place, e.g. by an atomic update.
    #[must_use]
    pub const fn read_write(addr: u64, len: u16) -> Self {
        Self {
            addr,
            len,
            is_read: true,
            is_write: true,
        }
    }

    /// Record kind for this operand.
    ///
    /// A host never reports an operand that is neither read nor written;
    /// should one slip through, it is recorded as a plain read.
    #[must_use]
    pub const fn kind(self) -> AccessKind {
        debug_assert!(self.is_read || self.is_write);
        match (self.is_read, self.is_write) {
            (true, true) => AccessKind::ReadWrite,
            (false, true) => AccessKind::Write,
            _ => AccessKind::Read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(MemOperand::read(0, 8).kind(), AccessKind::Read);
        assert_eq!(MemOperand::write(0, 8).kind(), AccessKind::Write);
        assert_eq!(MemOperand::read_write(0, 8).kind(), AccessKind::ReadWrite);
    }

    #[test]
    fn test_constructors_carry_address_and_len() {
        let op = MemOperand::write(0xdead_beef, 16);
        assert_eq!(op.addr, 0xdead_beef);
        assert_eq!(op.len, 16);
        assert!(!op.is_read);
        assert!(op.is_write);
    }
}
