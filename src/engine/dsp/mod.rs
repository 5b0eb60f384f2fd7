pub mod biquad;
pub mod dc;
pub mod delay_line;
pub mod entropy;
pub mod envelope;
pub mod fir;
pub mod noise;
pub mod shaper;
pub mod smooth;
pub mod svf;
pub mod thermal;
pub mod transient;
pub mod variance;
pub mod voltage;
