//! Minimal abstraction over the inter-process transport: point-to-point
//! broadcast, all-reduce with a caller-supplied reducer, all-gather, and a
//! barrier, plus the process's rank and the cluster's size.
//!
//! Two implementations ship: [`LocalTransport`], the default, degrades every
//! collective to identity (`rank() == 0`, `size() == 1`) so the engine runs
//! unmodified on a single process with no cluster support compiled in;
//! [`MpiTransport`], gated behind the `cluster` feature, backs the same
//! trait with the real `mpi` crate.

use msa_core::error::MsaError;

/// Rank and world-size queries, independent of any value type a collective
/// might move.
pub trait ClusterInfo {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Blocks until every rank has reached this call.
    fn barrier(&self);
}

/// The collective primitives over a value type `T`. Parameterized on `T`
/// (rather than making the methods themselves generic) so that
/// [`MpiTransport`] can require `T: mpi::traits::Equivalence` without
/// forcing that bound onto [`LocalTransport`], which needs only `Clone`.
pub trait Collective<T>: ClusterInfo {
    /// Broadcasts `value` from `root` to every rank. On `LocalTransport`
    /// this is always a no-op identity since `root` is the only rank.
    fn broadcast(&self, value: T, root: usize) -> T;

    /// Gathers one value per rank, in rank order, onto every rank.
    fn allgather(&self, value: T) -> Vec<T>;

    /// Combines every rank's value with a pure, associative, commutative
    /// `reducer`, returning the same result on every rank.
    fn allreduce(&self, value: T, reducer: impl Fn(T, T) -> T) -> T;
}

/// Single-process transport: every collective degrades to identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransport;

impl ClusterInfo for LocalTransport {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}
}

impl<T: Clone> Collective<T> for LocalTransport {
    fn broadcast(&self, value: T, root: usize) -> T {
        debug_assert_eq!(root, 0, "LocalTransport has exactly one rank");
        value
    }

    fn allgather(&self, value: T) -> Vec<T> {
        vec![value]
    }

    fn allreduce(&self, value: T, _reducer: impl Fn(T, T) -> T) -> T {
        value
    }
}

/// Small, fixed-size outcome used to elevate a single-rank failure into a
/// value every rank can observe via an ordinary collective, without routing
/// the (potentially unbounded) error message itself across the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "cluster", derive(mpi::traits::Equivalence))]
pub struct CollectiveOutcome {
    pub ok: bool,
    pub exit_code: i32,
}

impl CollectiveOutcome {
    fn ok() -> Self {
        Self {
            ok: true,
            exit_code: 0,
        }
    }

    fn err(exit_code: i32) -> Self {
        Self {
            ok: false,
            exit_code,
        }
    }
}

/// Elevates a single rank's local result to a collective one: every rank
/// calls this with its own outcome, and every rank observes the same
/// decision — `Ok(())` only if every rank succeeded, otherwise a
/// [`MsaError::TransportError`] naming the first failing exit code in rank
/// order. This is the synchronization point spec'd so that no rank is left
/// waiting inside a later collective while its peers have already unwound.
pub fn elevate_error<C>(transport: &C, local: Result<(), &MsaError>) -> Result<(), MsaError>
where
    C: Collective<CollectiveOutcome>,
{
    let outcome = match local {
        Ok(()) => CollectiveOutcome::ok(),
        Err(error) => CollectiveOutcome::err(error.exit_code()),
    };

    log::trace!("elevating rank {} outcome (ok={}) through the collective error barrier", transport.rank(), outcome.ok);
    let all = transport.allgather(outcome);
    match all.into_iter().find(|o| !o.ok) {
        None => Ok(()),
        Some(failed) => Err(MsaError::TransportError(format!(
            "a peer rank failed with exit code {}",
            failed.exit_code
        ))),
    }
}

#[cfg(feature = "cluster")]
mod mpi_transport {
    use super::{ClusterInfo, Collective};
    use mpi::topology::SystemCommunicator;
    use mpi::traits::*;

    /// MPI-backed transport. Construction requires an initialized
    /// [`mpi::environment::Universe`], held by the caller for the lifetime
    /// of the process (rsmpi tears down MPI when it is dropped).
    pub struct MpiTransport {
        world: SystemCommunicator,
    }

    impl MpiTransport {
        pub fn new(universe: &mpi::environment::Universe) -> Self {
            Self {
                world: universe.world(),
            }
        }
    }

    impl ClusterInfo for MpiTransport {
        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }

    impl<T> Collective<T> for MpiTransport
    where
        T: Equivalence + Clone + Default,
    {
        fn broadcast(&self, value: T, root: usize) -> T {
            let mut buf = value;
            self.world.process_at_rank(root as i32).broadcast_into(&mut buf);
            buf
        }

        fn allgather(&self, value: T) -> Vec<T> {
            let mut buf = vec![T::default(); self.size()];
            self.world.all_gather_into(&value, &mut buf[..]);
            buf
        }

        fn allreduce(&self, value: T, reducer: impl Fn(T, T) -> T) -> T {
            // Gather every rank's value and fold locally with the caller's
            // reducer, rather than an `MPI_Allreduce` with a custom
            // `UserOperation` — this avoids that API's unsafe raw-pointer
            // callback signature for the handful of ranks this engine
            // targets (one GPU per process).
            let mut all = self.allgather(value).into_iter();
            let first = all.next().expect("world size is at least 1");
            all.fold(first, reducer)
        }
    }
}

#[cfg(feature = "cluster")]
pub use mpi_transport::MpiTransport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_transport_degrades_every_collective_to_identity() {
        let transport = LocalTransport;
        assert_eq!(transport.rank(), 0);
        assert_eq!(transport.size(), 1);
        assert_eq!(Collective::broadcast(&transport, 42, 0), 42);
        assert_eq!(Collective::allgather(&transport, 7), vec![7]);
        assert_eq!(
            Collective::allreduce(&transport, 3, |a: i32, b: i32| a + b),
            3
        );
    }

    #[test]
    fn elevate_error_passes_through_when_every_rank_ok() {
        let transport = LocalTransport;
        assert!(elevate_error(&transport, Ok(())).is_ok());
    }

    #[test]
    fn elevate_error_surfaces_a_failing_rank() {
        let transport = LocalTransport;
        let err = MsaError::DeviceOutOfMemory(1024);
        let result = elevate_error(&transport, Err(&err));
        assert!(matches!(result, Err(MsaError::TransportError(_))));
    }
}
