use std::borrow::Cow;

use indicatif::MultiProgress;
use indicatif::ProgressBar;

/// Progress bar calls that quietly do nothing when there is no bar.
pub trait MaybeProgress {
    fn maybe_inc(&self, n: u64);
    fn maybe_set_length(&self, len: u64);
    fn maybe_set_prefix(&self, prefix: impl Into<Cow<'static, str>>);
    fn maybe_set_message(&self, msg: impl Into<Cow<'static, str>>);
    fn maybe_finish_and_clear(&self);
}

impl MaybeProgress for Option<ProgressBar> {
    fn maybe_inc(&self, n: u64) {
        if let Some(pb) = self {
            pb.inc(n);
        }
    }

    fn maybe_set_length(&self, len: u64) {
        if let Some(pb) = self {
            pb.set_length(len);
        }
    }

    fn maybe_set_prefix(&self, prefix: impl Into<Cow<'static, str>>) {
        if let Some(pb) = self {
            pb.set_prefix(prefix);
        }
    }

    fn maybe_set_message(&self, msg: impl Into<Cow<'static, str>>) {
        if let Some(pb) = self {
            pb.set_message(msg);
        }
    }

    fn maybe_finish_and_clear(&self) {
        if let Some(pb) = self {
            pb.finish_and_clear();
        }
    }
}

pub trait MaybeMultiProgress {
    fn maybe_add(&self, pb: ProgressBar) -> Option<ProgressBar>;
    fn maybe_remove(&self, pb: Option<ProgressBar>);
}

impl MaybeMultiProgress for Option<MultiProgress> {
    fn maybe_add(&self, pb: ProgressBar) -> Option<ProgressBar> {
        self.as_ref().map(|mp| mp.add(pb))
    }

    fn maybe_remove(&self, pb: Option<ProgressBar>) {
        if let Some(mp) = self {
            if let Some(pb) = &pb {
                mp.remove(pb);
            }
        }
    }
}
