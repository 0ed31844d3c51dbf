pub mod bio;
pub mod clean;
pub mod codec;
pub mod interval;
pub mod render;
pub mod warning;

pub use bio::{BioTag, parse_bio_line};
pub use clean::{SeqLabel, clean_seq_label};
pub use codec::LabelCodec;
pub use interval::{Iit, Interval, OUTSIDE_TAG, SourceSpan, WordTag};
pub use render::{RenderStyle, RenderedLabels};
pub use warning::{Checked, ShapeWarning};
