use std::ops::BitXor;

/// Three-valued assignment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum LBool {
    False,
    True,
    Undef,
}

impl LBool {
    pub fn is_undef(self) -> bool {
        self == LBool::Undef
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            LBool::False => Some(false),
            LBool::True => Some(true),
            LBool::Undef => None,
        }
    }
}

impl From<bool> for LBool {
    fn from(b: bool) -> Self {
        if b {
            LBool::True
        } else {
            LBool::False
        }
    }
}

// `value ^ is_negative` flips the assignment for a negative literal.
impl BitXor<bool> for LBool {
    type Output = LBool;

    fn bitxor(self, rhs: bool) -> Self::Output {
        match (self, rhs) {
            (LBool::Undef, _) => LBool::Undef,
            (value, false) => value,
            (LBool::False, true) => LBool::True,
            (LBool::True, true) => LBool::False,
        }
    }
}
