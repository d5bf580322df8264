//! Boilerplate reduction for arithmetic on single-field newtypes.

/// Implements an arithmetic operator for a tuple newtype by delegating to the inner value.
///
/// ```rust,ignore
/// op!(binary Cents, Add, add);
/// op!(inplace Cents, AddAssign, add_assign);
/// op!(unary Cents, Neg, neg);
/// ```
#[macro_export]
macro_rules! op {
    (binary $name:ident, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $name {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0, rhs.0))
            }
        }
    };
    (inplace $name:ident, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $name {
            fn $method(&mut self, rhs: Self) {
                std::ops::$trait::$method(&mut self.0, rhs.0)
            }
        }
    };
    (unary $name:ident, $trait:ident, $method:ident) => {
        impl std::ops::$trait for $name {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(std::ops::$trait::$method(self.0))
            }
        }
    };
}
