use futures_core::stream::Stream;
use pin_project::pin_project;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Stream adaptors used around the bridges.
pub trait AsyncStreamExt: Stream {
    /// Yields items until, and including, the first one for which `test`
    /// returns true, then ends.
    fn stop_if<F>(self, test: F) -> StopIf<Self, F>
    where
        F: FnMut(&Self::Item) -> bool,
        Self: Sized,
    {
        StopIf {
            upstream: self,
            predicate: Some(test),
        }
    }

    /// Wraps every item in `Ok`, turning an infallible stream into the
    /// `Result` shaped push sequence the `collect_*` bridges consume.
    ///
    /// ```
    /// use async_state::AsyncStreamExt;
    /// use futures::stream::{self, StreamExt};
    /// use std::convert::Infallible;
    ///
    /// # futures::executor::block_on(async {
    /// let items: Vec<Result<i32, Infallible>> = stream::iter([1, 2]).fallible().collect().await;
    /// assert_eq!(items, vec![Ok(1), Ok(2)]);
    /// # });
    /// ```
    fn fallible<E>(self) -> Fallible<Self, E>
    where
        Self: Sized,
    {
        Fallible {
            stream: self,
            _error: PhantomData,
        }
    }
}
impl<T: ?Sized> AsyncStreamExt for T where T: Stream {}

/// Stream created by [`AsyncStreamExt::stop_if`].
///
/// The predicate is dropped once the stream has stopped; after that the
/// upstream is never polled again.
#[pin_project]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct StopIf<St, F> {
    #[pin]
    upstream: St,
    predicate: Option<F>,
}

impl<St, F> Stream for StopIf<St, F>
where
    St: Stream,
    F: FnMut(&St::Item) -> bool,
{
    type Item = St::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let Some(predicate) = this.predicate.as_mut() else {
            return Poll::Ready(None);
        };

        let item = ready!(this.upstream.poll_next(cx));
        let last = match &item {
            Some(item) => predicate(item),
            None => true,
        };
        if last {
            *this.predicate = None;
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.predicate {
            None => (0, Some(0)),
            Some(_) => (0, self.upstream.size_hint().1),
        }
    }
}

/// Stream created by [`AsyncStreamExt::fallible`].
#[pin_project]
#[derive(Debug)]
#[must_use = "Streams do nothing unless polled"]
pub struct Fallible<A, E> {
    #[pin]
    stream: A,
    _error: PhantomData<fn() -> E>,
}

impl<A, E> Stream for Fallible<A, E>
where
    A: Stream,
{
    type Item = Result<A::Item, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx).map(|item| item.map(Ok))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}
