use std::collections::VecDeque;

/// FIFO of fixed-size single-channel audio blocks realizing a constant
/// per-block delay.
///
/// The queue is pre-filled with silence so that the first pops return
/// silence for exactly the configured delay before live data comes
/// back out. With one push and one pop per cycle the depth stays
/// constant, so the K-th pop returns the (K−N)-th push.
///
/// The delay is quantized to whole blocks: a requested delay of D
/// seconds realizes `floor(D * rate / block_size)` blocks, i.e.
/// `floor(D * rate / block_size) * block_size / rate` seconds.
#[derive(Debug)]
pub struct DelayQueue {
    blocks: VecDeque<Vec<i16>>,
    block_size: usize,
}

impl DelayQueue {
    /// Create a queue pre-filled with `floor(delay_secs * sample_rate /
    /// block_size)` blocks of `silence`.
    pub fn new(delay_secs: f64, sample_rate: u32, block_size: usize, silence: i16) -> Self {
        let depth = (delay_secs * sample_rate as f64 / block_size as f64) as usize;
        let mut blocks = VecDeque::with_capacity(depth + 1);
        for _ in 0..depth {
            blocks.push_back(vec![silence; block_size]);
        }
        Self { blocks, block_size }
    }

    /// Append a block to the tail.
    pub fn push(&mut self, block: Vec<i16>) {
        debug_assert_eq!(block.len(), self.block_size);
        self.blocks.push_back(block);
    }

    /// Remove and return the head block, if any.
    ///
    /// Under the one-push-one-pop cycle discipline the queue is never
    /// empty when popped; `None` only shows up if that discipline is
    /// broken.
    pub fn pop(&mut self) -> Option<Vec<i16>> {
        self.blocks.pop_front()
    }

    /// Push `block`, then pop the head: the one operation the loop
    /// performs each cycle. Cannot fail: the queue is nonempty right
    /// after the push.
    pub fn rotate(&mut self, block: Vec<i16>) -> Vec<i16> {
        self.push(block);
        match self.pop() {
            Some(head) => head,
            None => unreachable!("queue is nonempty immediately after push"),
        }
    }

    /// Current number of queued blocks.
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefill_depth_is_floor_division() {
        assert_eq!(DelayQueue::new(0.5, 8, 4, 0).depth(), 1);
        assert_eq!(DelayQueue::new(1.0, 16_000, 1024, 0).depth(), 15);
        assert_eq!(DelayQueue::new(0.0, 48_000, 1024, 0).depth(), 0);
        // 0.1 * 16000 / 1024 = 1.5625 → 1
        assert_eq!(DelayQueue::new(0.1, 16_000, 1024, 0).depth(), 1);
    }

    #[test]
    fn prefill_blocks_are_silence() {
        let mut queue = DelayQueue::new(0.5, 8, 4, 0);
        assert_eq!(queue.pop(), Some(vec![0i16; 4]));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn end_to_end_half_second_delay() {
        // block_size=4, rate=8, delay=0.5 → one pre-fill block.
        let mut queue = DelayQueue::new(0.5, 8, 4, 0);
        assert_eq!(queue.depth(), 1);

        assert_eq!(queue.rotate(vec![1, 2, 3, 4]), vec![0, 0, 0, 0]);
        assert_eq!(queue.rotate(vec![5, 6, 7, 8]), vec![1, 2, 3, 4]);
        assert_eq!(queue.rotate(vec![9, 10, 11, 12]), vec![5, 6, 7, 8]);
        assert_eq!(queue.depth(), 1);
    }

    #[test]
    fn kth_pop_is_k_minus_nth_push() {
        let n = 3;
        let mut queue = DelayQueue::new(n as f64, 1, 1, 0);
        assert_eq!(queue.depth(), n);

        for k in 1..=20i16 {
            let popped = queue.rotate(vec![k]);
            if k as usize <= n {
                assert_eq!(popped, vec![0]);
            } else {
                assert_eq!(popped, vec![k - n as i16]);
            }
        }
    }

    #[test]
    fn round_trip_preserves_order_after_silence() {
        let mut queue = DelayQueue::new(2.0, 4, 4, 0);
        let n = queue.depth();
        assert_eq!(n, 2);

        let pushed: Vec<Vec<i16>> = (0..10)
            .map(|i| (0..4).map(|j| i * 4 + j).collect())
            .collect();

        let mut popped = Vec::new();
        for block in &pushed {
            popped.push(queue.rotate(block.clone()));
        }
        // Drain what is still queued.
        while let Some(block) = queue.pop() {
            popped.push(block);
        }

        assert_eq!(&popped[n..], &pushed[..]);
    }

    #[test]
    fn depth_constant_under_rotate() {
        let mut queue = DelayQueue::new(1.0, 8, 2, 0);
        let depth = queue.depth();
        for _ in 0..100 {
            queue.rotate(vec![7, 7]);
            assert_eq!(queue.depth(), depth);
        }
    }

    #[test]
    fn zero_delay_rotate_is_passthrough() {
        let mut queue = DelayQueue::new(0.0, 8, 4, 0);
        assert_eq!(queue.depth(), 0);
        assert_eq!(queue.rotate(vec![1, 2, 3, 4]), vec![1, 2, 3, 4]);
    }

    #[test]
    fn nonzero_silence_value() {
        let mut queue = DelayQueue::new(1.0, 2, 2, -1);
        assert_eq!(queue.rotate(vec![5, 5]), vec![-1, -1]);
    }
}
