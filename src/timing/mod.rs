//! Discrete-time rate conversion.
//!
//! Both halves of the system map events on a frame-quantized clock onto
//! a different rate: the quantizer snaps a flicker frequency onto whole
//! refresh frames, the converter spreads video frames over a fixed
//! sampling rate. Both keep the integer result within one unit of the
//! ideal continuous-time value.

mod converter;
mod quantizer;
mod timebase;

pub use converter::{advance, ConversionState, RateConverter, SampleMode};
pub use quantizer::{quantize, FlashPlan, FrequencyAdjustment};
pub use timebase::TimeBase;
