use itertools::Itertools;

/// One worker's slice of the request sequence, in input order
#[derive(Debug, PartialEq, Eq)]
pub struct Batch<R> {
  pub index: usize,
  pub items: Vec<R>,
}

impl<R> Batch<R> {
  fn new(index: usize) -> Self {
    Batch {
      index,
      items: vec![],
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

/// Round-robin partition: item `i` lands in batch `i % buckets`. Yields `buckets` batches, trailing
/// ones possibly empty, with sizes differing by at most one. Zero buckets hold nothing, so no batch
/// is
/// returned and the items are dropped
pub fn partition<R>(items: Vec<R>, buckets: usize) -> Vec<Batch<R>> {
  if buckets.eq(&0) {
    return vec![];
  }

  let mut batches = (0..buckets).map(Batch::new).collect_vec();
  let capacity = items.len() / buckets + 1;

  batches
    .iter_mut()
    .for_each(|batch| batch.items.reserve_exact(capacity));

  for (i, item) in items.into_iter().enumerate() {
    batches[i % buckets].items.push(item);
  }

  batches
}

/// Batches that actually carry work
pub(crate) fn occupied<R>(batches: Vec<Batch<R>>) -> impl Iterator<Item = Batch<R>> {
  batches.into_iter().filter(|batch| !batch.is_empty())
}

/// Number of `chunk_size`-bounded groups needed for `len` items
pub fn bucket_count(len: usize, chunk_size: usize) -> usize {
  len / chunk_size + usize::from(len % chunk_size > 0)
}
