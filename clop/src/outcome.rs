/// What a handler tells the dispatcher after processing one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Option accepted, keep scanning.
    Ok,
    /// Option rejected, keep scanning so later mistakes are reported too.
    /// The scan as a whole fails once it reaches its end.
    Fail,
    /// Stop scanning now and report this (negative) status.
    Abort(i32),
}

impl Outcome {
    /// Abort with the generic status `-1`.
    pub const fn abort() -> Self {
        Outcome::Abort(-1)
    }

    /// Integer status: `0`, `1` or the abort code.
    pub fn status(self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::Fail => 1,
            Outcome::Abort(code) => code,
        }
    }
}

/// Zero is success, negative aborts, positive is a soft failure.
impl From<i32> for Outcome {
    fn from(status: i32) -> Self {
        match status {
            0 => Outcome::Ok,
            s if s < 0 => Outcome::Abort(s),
            _ => Outcome::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_sign() {
        assert_eq!(Outcome::from(0), Outcome::Ok);
        assert_eq!(Outcome::from(7), Outcome::Fail);
        assert_eq!(Outcome::from(-3), Outcome::Abort(-3));
    }

    #[test]
    fn status_of_variants() {
        assert_eq!(Outcome::Ok.status(), 0);
        assert_eq!(Outcome::Fail.status(), 1);
        assert_eq!(Outcome::abort().status(), -1);
    }
}
