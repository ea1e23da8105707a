use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cooperative scheduler hint: yields once to let other tasks run.
///
/// The returned future is `Pending` on its first poll and wakes the current task
/// right away. The task goes to the back of the ready queue and resumes in the
/// next batch, after every task that was already runnable.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();

        Poll::Pending
    }
}
