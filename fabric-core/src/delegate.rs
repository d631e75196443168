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

//! The L1 delegate primitive (spec §3, §4.1): a value-typed handle to a
//! callable of one fixed signature, in one of four kinds — free function,
//! non-owning bound method, shared-owning bound method, or a stored
//! callable object.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::{FabricError, FabricResult};

/// Monotonic source of identity tags for [`DelegateKind::Callable`], since
/// a boxed closure isn't otherwise comparable for equality (spec §9's
/// tagged-variant design note; SPEC_FULL §3 "Identity representation").
static CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_callable_id() -> u64 {
    CALLABLE_ID.fetch_add(1, Ordering::Relaxed)
}

type BoxedInvoke<Args, R> = Arc<dyn Fn(Args) -> R + Send + Sync>;

enum DelegateKind<Args, R> {
    /// Bound via [`Delegate::bind_free`]. Equality compares the function
    /// pointer's address.
    Free { addr: usize, invoke: BoxedInvoke<Args, R> },

    /// Bound via [`Delegate::bind_method`]: a non-owning `(object,
    /// method)` pair. The caller guarantees the object outlives every
    /// invocation, which this binding expresses as `&'static`.
    RawMethod {
        obj_addr: usize,
        method_addr: usize,
        invoke: BoxedInvoke<Args, R>,
    },

    /// Bound via [`Delegate::bind_shared`]: a shared-owning `(object,
    /// method)` pair. The delegate keeps the object alive via the `Arc`.
    SharedMethod {
        handle: Arc<dyn Any + Send + Sync>,
        method_addr: usize,
        invoke: BoxedInvoke<Args, R>,
    },

    /// Bound via [`Delegate::bind_callable`]: an owned copy of a movable
    /// callable (closures, bound objects).
    Callable { id: u64, invoke: BoxedInvoke<Args, R> },
}

impl<Args, R> Clone for DelegateKind<Args, R> {
    fn clone(&self) -> Self {
        match self {
            DelegateKind::Free { addr, invoke } => DelegateKind::Free {
                addr: *addr,
                invoke: Arc::clone(invoke),
            },
            DelegateKind::RawMethod {
                obj_addr,
                method_addr,
                invoke,
            } => DelegateKind::RawMethod {
                obj_addr: *obj_addr,
                method_addr: *method_addr,
                invoke: Arc::clone(invoke),
            },
            DelegateKind::SharedMethod {
                handle,
                method_addr,
                invoke,
            } => DelegateKind::SharedMethod {
                handle: Arc::clone(handle),
                method_addr: *method_addr,
                invoke: Arc::clone(invoke),
            },
            DelegateKind::Callable { id, invoke } => DelegateKind::Callable {
                id: *id,
                invoke: Arc::clone(invoke),
            },
        }
    }
}

impl<Args, R> PartialEq for DelegateKind<Args, R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DelegateKind::Free { addr: a, .. }, DelegateKind::Free { addr: b, .. }) => a == b,
            (
                DelegateKind::RawMethod {
                    obj_addr: oa,
                    method_addr: ma,
                    ..
                },
                DelegateKind::RawMethod {
                    obj_addr: ob,
                    method_addr: mb,
                    ..
                },
            ) => oa == ob && ma == mb,
            (
                DelegateKind::SharedMethod {
                    handle: ha,
                    method_addr: ma,
                    ..
                },
                DelegateKind::SharedMethod {
                    handle: hb,
                    method_addr: mb,
                    ..
                },
            ) => Arc::ptr_eq(ha, hb) && ma == mb,
            (DelegateKind::Callable { id: a, .. }, DelegateKind::Callable { id: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

/// A value-typed handle to a callable of fixed signature `R(A1, ..., An)`,
/// represented here as `Delegate<(A1, ..., An), R>` (spec §3, §4.1).
///
/// Two delegates compare equal iff they have the same kind and targets
/// that refer to the same underlying callable (spec §3's equality
/// invariant). Delegates are deep-copyable via [`Clone`]; cloning a
/// shared-ownership delegate increments the `Arc` strong count exactly as
/// the original's `shared_ptr` refcount would.
pub struct Delegate<Args, R> {
    kind: Option<DelegateKind<Args, R>>,
}

impl<Args, R> Delegate<Args, R> {
    /// An empty delegate. Invoking it fails with
    /// [`FabricError::EmptyInvocation`] (spec §4.1).
    #[must_use]
    pub fn empty() -> Self {
        Self { kind: None }
    }

    /// `true` if no target is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
    }

    /// Performs the bound call. Fails with
    /// [`FabricError::EmptyInvocation`] if nothing is bound.
    ///
    /// # Errors
    /// Returns `Err(FabricError::EmptyInvocation)` for an empty delegate.
    pub fn invoke(&self, args: Args) -> FabricResult<R> {
        match &self.kind {
            Some(kind) => Ok(kind.invoke()(args)),
            None => Err(FabricError::EmptyInvocation),
        }
    }

    /// Structural equality per spec §3: same kind, same target identity.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl<Args, R> DelegateKind<Args, R> {
    fn invoke(&self) -> &BoxedInvoke<Args, R> {
        match self {
            DelegateKind::Free { invoke, .. }
            | DelegateKind::RawMethod { invoke, .. }
            | DelegateKind::SharedMethod { invoke, .. }
            | DelegateKind::Callable { invoke, .. } => invoke,
        }
    }
}

impl<Args, R> Clone for Delegate<Args, R> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
        }
    }
}

impl<Args, R> PartialEq for Delegate<Args, R> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl<Args, R> Default for Delegate<Args, R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<Args, R> std::fmt::Debug for Delegate<Args, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.kind {
            None => "Empty",
            Some(DelegateKind::Free { .. }) => "Free",
            Some(DelegateKind::RawMethod { .. }) => "RawMethod",
            Some(DelegateKind::SharedMethod { .. }) => "SharedMethod",
            Some(DelegateKind::Callable { .. }) => "Callable",
        };
        f.debug_struct("Delegate").field("kind", &kind).finish()
    }
}

/// Generates, for one arity, the natural multi-argument `bind_*`
/// constructors on `Delegate<(A1, ..., An), R>`. Mirrors
/// [`crate::callable::impl_callable`]'s per-arity expansion so the public
/// API reads like an ordinary Rust function signature (`fn(i32, &str) ->
/// bool`) rather than exposing the internal tuple representation.
macro_rules! impl_delegate_arity {
    ( $( $arg:ident : $idx:tt ),* ) => {
        impl<R, $( $arg, )*> Delegate<( $( $arg, )* ), R>
        where
            R: 'static,
            $( $arg: 'static, )*
        {
            /// Bind a free function pointer (spec §4.1). Equality compares
            /// the pointer's address.
            #[must_use]
            pub fn bind_free(fp: fn($( $arg ),*) -> R) -> Self {
                let addr = fp as usize;
                Self {
                    kind: Some(DelegateKind::Free {
                        addr,
                        invoke: Arc::new(move |args: ( $( $arg, )* )| Callable::call(&fp, args)),
                    }),
                }
            }

            /// Bind a non-owning `(object, method)` pair (spec §4.1). The
            /// caller guarantees `obj` outlives every invocation; this is
            /// expressed with `&'static` rather than an unchecked raw
            /// pointer.
            #[must_use]
            pub fn bind_method<T: 'static>(
                obj: &'static T,
                method: fn(&T, $( $arg ),*) -> R,
            ) -> Self {
                let obj_addr = obj as *const T as usize;
                let method_addr = method as usize;
                Self {
                    kind: Some(DelegateKind::RawMethod {
                        obj_addr,
                        method_addr,
                        invoke: Arc::new(move |args: ( $( $arg, )* )| {
                            #[allow(non_snake_case)]
                            let ( $( $arg, )* ) = args;
                            method(obj, $( $arg ),*)
                        }),
                    }),
                }
            }

            /// Bind a shared-ownership `(object, method)` pair (spec
            /// §4.1). The delegate keeps `handle` alive.
            #[must_use]
            pub fn bind_shared<T: Send + Sync + 'static>(
                handle: Arc<T>,
                method: fn(&T, $( $arg ),*) -> R,
            ) -> Self {
                let method_addr = method as usize;
                let erased: Arc<dyn Any + Send + Sync> = handle.clone();
                Self {
                    kind: Some(DelegateKind::SharedMethod {
                        handle: erased,
                        method_addr,
                        invoke: Arc::new(move |args: ( $( $arg, )* )| {
                            #[allow(non_snake_case)]
                            let ( $( $arg, )* ) = args;
                            method(&handle, $( $arg ),*)
                        }),
                    }),
                }
            }

            /// Bind an owned copy of a movable callable (spec §4.1): a
            /// closure or bound object stored by value. Two clones of one
            /// bound callable compare equal; two freshly-constructed
            /// callables never do, even if behaviorally identical
            /// (SPEC_FULL §3).
            #[must_use]
            pub fn bind_callable<F>(callable: F) -> Self
            where
                F: Callable<( $( $arg, )* ), R> + Send + Sync + 'static,
            {
                let id = next_callable_id();
                Self {
                    kind: Some(DelegateKind::Callable {
                        id,
                        invoke: Arc::new(move |args: ( $( $arg, )* )| callable.call(args)),
                    }),
                }
            }
        }
    };
}

impl_delegate_arity!();
impl_delegate_arity!(A1: 0);
impl_delegate_arity!(A1: 0, A2: 1);
impl_delegate_arity!(A1: 0, A2: 1, A3: 2);
impl_delegate_arity!(A1: 0, A2: 1, A3: 2, A4: 3);
impl_delegate_arity!(A1: 0, A2: 1, A3: 2, A4: 3, A5: 4);

#[cfg(test)]
mod tests {
    use super::*;

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    fn mul(a: i32, b: i32) -> i32 {
        a * b
    }

    #[test]
    fn empty_invocation_fails() {
        let d: Delegate<(i32,), i32> = Delegate::empty();
        assert_eq!(d.invoke((1,)), Err(FabricError::EmptyInvocation));
    }

    #[test]
    fn free_function_invokes_and_compares_equal() {
        let d1 = Delegate::bind_free(add);
        let d2 = Delegate::bind_free(add);
        assert_eq!(d1.invoke((2, 3)).unwrap(), 5);
        assert!(d1.equals(&d2));
    }

    #[test]
    fn different_free_functions_compare_unequal() {
        let d1 = Delegate::bind_free(add);
        let d2 = Delegate::bind_free(mul);
        assert!(!d1.equals(&d2));
    }

    #[test]
    fn clone_compares_equal_to_original() {
        let d1 = Delegate::bind_free(add);
        let d2 = d1.clone();
        assert!(d1.equals(&d2));
    }

    #[test]
    fn bind_callable_identity_is_per_construction() {
        let d1 = Delegate::bind_callable(|a: i32, b: i32| a + b);
        let d2 = d1.clone();
        let d3 = Delegate::bind_callable(|a: i32, b: i32| a + b);
        assert!(d1.equals(&d2));
        assert!(!d1.equals(&d3));
        assert_eq!(d1.invoke((4, 5)).unwrap(), 9);
    }

    #[test]
    fn bind_shared_keeps_object_alive_and_refcounts() {
        struct Counter;
        impl Counter {
            fn value(&self, x: i32) -> i32 {
                x * 10
            }
        }
        let handle = Arc::new(Counter);
        let weak_count_before = Arc::strong_count(&handle);
        let d = Delegate::bind_shared(handle.clone(), Counter::value);
        assert_eq!(Arc::strong_count(&handle), weak_count_before + 1);
        assert_eq!(d.invoke((4,)).unwrap(), 40);
        let d2 = d.clone();
        assert_eq!(Arc::strong_count(&handle), weak_count_before + 2);
        assert!(d.equals(&d2));
        drop(d);
        drop(d2);
        assert_eq!(Arc::strong_count(&handle), weak_count_before);
    }

    #[test]
    fn bind_method_non_owning() {
        struct Scaler {
            factor: i32,
        }
        impl Scaler {
            fn scale(&self, x: i32) -> i32 {
                x * self.factor
            }
        }
        static SCALER: Scaler = Scaler { factor: 3 };
        let d = Delegate::bind_method(&SCALER, Scaler::scale);
        assert_eq!(d.invoke((7,)).unwrap(), 21);
    }

    #[test]
    fn zero_arity_delegate() {
        fn hello() -> &'static str {
            "hi"
        }
        let d = Delegate::bind_free(hello);
        assert_eq!(d.invoke(()).unwrap(), "hi");
    }
}
