use rtrb::{Consumer, Producer, RingBuffer};

/// Write-only sink handing post-process mono samples to an analysis or UI
/// thread. The audio side only pushes and drops on overflow; it never reads,
/// never blocks, never allocates.
pub struct TapSink {
  producer: Option<Producer<f32>>,
}

impl TapSink {
  pub fn new() -> Self { Self { producer: None } }

  /// Creates the SPSC queue and returns the consumer end for the collaborator.
  pub fn attach(&mut self, capacity: usize) -> Consumer<f32> {
    let (producer, consumer) = RingBuffer::new(capacity.max(256));
    self.producer = Some(producer);
    consumer
  }

  pub fn detach(&mut self) { self.producer = None; }

  #[inline]
  pub fn push(&mut self, sample: f32) {
    if let Some(p) = self.producer.as_mut() {
      // full queue means the reader fell behind; dropping beats blocking
      let _ = p.push(sample);
    }
  }
}

impl Default for TapSink {
  fn default() -> Self { Self::new() }
}
