use std::{
    iter,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Per-block rendering context passed down the graph. Every node is sampled at most once per
/// `batch_index`.
#[derive(Clone, Copy, Debug)]
pub struct SigCtx {
    pub sample_rate_hz: f32,
    pub batch_index: u64,
    pub num_samples: usize,
}

pub trait Buf<T>
where
    T: Clone,
{
    fn iter(&self) -> impl Iterator<Item = T>;

    /// Clears `out` and populates it with the contents of `self`.
    fn clone_to_vec(&self, out: &mut Vec<T>) {
        out.clear();
        for x in self.iter() {
            out.push(x);
        }
    }
}

impl<T> Buf<T> for &Vec<T>
where
    T: Clone,
{
    fn iter(&self) -> impl Iterator<Item = T> {
        (self as &[T]).iter().cloned()
    }

    fn clone_to_vec(&self, out: &mut Vec<T>) {
        out.clear();
        out.extend_from_slice(self);
    }
}

pub struct ConstBuf<T> {
    pub value: T,
    pub count: usize,
}

impl<T> Buf<T> for ConstBuf<T>
where
    T: Clone,
{
    fn iter(&self) -> impl Iterator<Item = T> {
        iter::repeat_n(&self.value, self.count).cloned()
    }

    fn clone_to_vec(&self, out: &mut Vec<T>) {
        out.clear();
        out.resize(self.count, self.value.clone());
    }
}

/// A signal with values produced for each audio sample, in blocks whose size is chosen by the
/// audio driver. Control signals (gesture-driven parameters) are also sampled at audio rate so
/// that downstream filters see a continuous input.
pub trait SigT {
    type Item: Clone;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item>;
}

/// Similar to `SigT` but populates a `Vec`, which makes it object safe.
pub trait SigSampleIntoBufT {
    type Item: Clone;

    fn sample_into_buf(&mut self, ctx: &SigCtx, buf: &mut Vec<Self::Item>);
}

impl SigT for f32 {
    type Item = Self;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        ConstBuf {
            value: *self,
            count: ctx.num_samples,
        }
    }
}

/// Wrapper type for the `SigT` trait.
#[derive(Clone)]
pub struct Sig<S>(pub S)
where
    S: SigT;

impl<S: SigT> SigT for Sig<S> {
    type Item = S::Item;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.0.sample(ctx)
    }
}

impl<S: SigT> SigSampleIntoBufT for Sig<S> {
    type Item = S::Item;

    fn sample_into_buf(&mut self, ctx: &SigCtx, buf: &mut Vec<Self::Item>) {
        self.0.sample(ctx).clone_to_vec(buf);
    }
}

/// A type-erased signal.
pub struct SigBoxed<T>
where
    T: Clone,
{
    sig: Box<dyn SigSampleIntoBufT<Item = T> + Send + Sync + 'static>,
    buf: Vec<T>,
}

impl<T> SigT for SigBoxed<T>
where
    T: Clone,
{
    type Item = T;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        self.sig.sample_into_buf(ctx, &mut self.buf);
        &self.buf
    }
}

pub fn sig_boxed<S>(sig: S) -> Sig<SigBoxed<S::Item>>
where
    S: SigT + Send + Sync + 'static,
{
    Sig(SigBoxed {
        sig: Box::new(Sig(sig)),
        buf: Vec::new(),
    })
}

/// Wrapper for a signal that prevents recomputation of its value for a particular block.
struct SigCached<S>
where
    S: SigT,
{
    sig: S,
    cache: Vec<S::Item>,
    next_batch_index: u64,
}

impl<S> SigCached<S>
where
    S: SigT,
{
    fn new(sig: S) -> Self {
        Self {
            sig,
            cache: Vec::new(),
            next_batch_index: 0,
        }
    }

    fn sample(&mut self, ctx: &SigCtx) -> &Vec<S::Item> {
        if ctx.batch_index >= self.next_batch_index {
            self.next_batch_index = ctx.batch_index + 1;
            let buf = self.sig.sample(ctx);
            buf.clone_to_vec(&mut self.cache);
        }
        &self.cache
    }
}

/// A wrapper of a signal which can be shallow-cloned. This is how a node feeding several sinks is
/// computed only once per block. Each clone copies the cached block into its own buffer so that
/// the buffer returned by `sample` has an appropriate lifetime.
pub struct SigShared<S>
where
    S: SigT,
{
    shared_cached_sig: Arc<RwLock<SigCached<S>>>,
    buf: Vec<S::Item>,
}

impl<S> SigShared<S>
where
    S: SigT,
{
    fn new(sig: S) -> Self {
        SigShared {
            shared_cached_sig: Arc::new(RwLock::new(SigCached::new(sig))),
            buf: Vec::new(),
        }
    }

    /// The final sample of the most recently computed block, if any block has been computed.
    pub fn last(&self) -> Option<S::Item> {
        read_lock(&self.shared_cached_sig).cache.last().cloned()
    }
}

impl<S> Clone for SigShared<S>
where
    S: SigT,
{
    fn clone(&self) -> Self {
        SigShared {
            shared_cached_sig: Arc::clone(&self.shared_cached_sig),
            buf: Vec::new(),
        }
    }
}

impl<S> SigT for SigShared<S>
where
    S: SigT,
{
    type Item = S::Item;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        let mut shared_cached_sig = write_lock(&self.shared_cached_sig);
        let cache = shared_cached_sig.sample(ctx);
        self.buf.clear();
        self.buf.extend_from_slice(cache);
        &self.buf
    }
}

pub fn sig_shared<S>(sig: S) -> Sig<SigShared<S>>
where
    S: SigT,
{
    Sig(SigShared::new(sig))
}

/// A signal whose value can be replaced from another thread. The audio thread reads it once per
/// block.
#[derive(Default)]
pub struct SigVar<T>(Arc<RwLock<T>>);

impl<T> SigVar<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    pub fn set(&self, value: T) {
        *write_lock(&self.0) = value;
    }
}

impl<T: Clone> SigVar<T> {
    pub fn get(&self) -> T {
        read_lock(&self.0).clone()
    }
}

impl<T> Clone for SigVar<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> SigT for SigVar<T>
where
    T: Clone,
{
    type Item = T;

    fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
        ConstBuf {
            count: ctx.num_samples,
            value: self.get(),
        }
    }
}

pub fn sig_var<T: Clone>(value: T) -> Sig<SigVar<T>> {
    Sig(SigVar::new(value))
}

// A panic on the audio thread must not take the control thread down with it, so poisoned locks
// are recovered rather than propagated.
pub(crate) fn read_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod test {
    use super::*;

    fn ctx(batch_index: u64, num_samples: usize) -> SigCtx {
        SigCtx {
            sample_rate_hz: 48_000.0,
            batch_index,
            num_samples,
        }
    }

    struct Counter(f32, Vec<f32>);

    impl SigT for Counter {
        type Item = f32;

        fn sample(&mut self, ctx: &SigCtx) -> impl Buf<Self::Item> {
            self.1.clear();
            for _ in 0..ctx.num_samples {
                self.0 += 1.0;
                self.1.push(self.0);
            }
            &self.1
        }
    }

    #[test]
    fn shared_sig_is_computed_once_per_block() {
        let mut a = sig_shared(Counter(0.0, Vec::new()));
        let mut b = a.clone();
        let mut out = Vec::new();
        a.sample(&ctx(0, 3)).clone_to_vec(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        b.sample(&ctx(0, 3)).clone_to_vec(&mut out);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        b.sample(&ctx(1, 2)).clone_to_vec(&mut out);
        assert_eq!(out, vec![4.0, 5.0]);
        assert_eq!(a.0.last(), Some(5.0));
    }

    #[test]
    fn var_reflects_latest_value() {
        let var = sig_var(1.0_f32);
        let mut reader = var.clone();
        var.0.set(3.5);
        let mut out = Vec::new();
        reader.sample(&ctx(0, 4)).clone_to_vec(&mut out);
        assert_eq!(out, vec![3.5; 4]);
    }
}
