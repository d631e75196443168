/*
 *   Copyright (c) 2024 Fabric Contributors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Bridges ordinary closures of arity 0 through 5 onto a single tuple type
//! `Args`, standing in for the C++ original's variadic `Args...` template
//! pack (SPEC_FULL §3, "Identity representation"). Rust has no variadic
//! generics, so every other module in this fabric is generic over one
//! `Args` tuple type rather than over `A1, ..., An` directly, and callers
//! write `fn(i32, &str) -> bool` the same way they always would — this
//! trait is what makes that possible without naming `(i32, &str)`
//! themselves at every call site.

/// A callable that accepts the tuple `Args` and returns `R`. Implemented
/// for plain `Fn` closures of arity 0..=5 via the macro below; user code
/// never implements this directly.
pub trait Callable<Args, R> {
    fn call(&self, args: Args) -> R;
}

macro_rules! impl_callable {
    ( $( $arg:ident ),* ) => {
        impl<R, F, $( $arg, )*> Callable<( $( $arg, )* ), R> for F
        where
            F: Fn( $( $arg, )* ) -> R,
        {
            #[allow(non_snake_case)]
            fn call(&self, args: ( $( $arg, )* )) -> R {
                let ( $( $arg, )* ) = args;
                (self)( $( $arg ),* )
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);

#[cfg(test)]
mod tests {
    use super::Callable;

    #[test]
    fn arity_zero() {
        let f = || 42;
        assert_eq!(Callable::<(), i32>::call(&f, ()), 42);
    }

    #[test]
    fn arity_two() {
        let add = |a: i32, b: i32| a + b;
        assert_eq!(Callable::<(i32, i32), i32>::call(&add, (2, 3)), 5);
    }

    #[test]
    fn arity_five() {
        let sum5 = |a: i32, b: i32, c: i32, d: i32, e: i32| a + b + c + d + e;
        assert_eq!(
            Callable::<(i32, i32, i32, i32, i32), i32>::call(&sum5, (1, 2, 3, 4, 5)),
            15
        );
    }
}
