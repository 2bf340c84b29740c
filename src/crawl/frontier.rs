// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: a breadth-first work queue plus the visited set.
//
// How it works:
// 1. The seed is canonicalized, marked visited and queued
// 2. The drain loop pops entries in FIFO order and hands them out
// 3. Discovered URLs come back through offer(): if the canonical URL was
//    never seen it is marked visited and queued, otherwise it is dropped
// 4. The site is done when the queue is empty
//
// A URL is marked visited when it is queued, not when it is fetched. That
// is what keeps two copies of one URL from ever being in flight at the same
// time, and it is why no other cycle detection is needed.
//
// The frontier has a single owner (the drain loop), so the
// check-then-enqueue in offer() needs no lock.
//
// Rust concepts:
// - HashSet: To track visited URLs (O(1) lookup)
// - VecDeque: Double-ended queue for breadth-first crawling
// =============================================================================

use crate::link::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// A unit of crawl work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: CanonicalUrl,
    /// Reached only as an external reference: mirror it, but don't crawl its anchors
    pub no_follow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierState {
    Idle,
    Running,
    Drained,
}

#[derive(Debug)]
pub struct Frontier {
    root_host: String,
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<CanonicalUrl>,
    state: FrontierState,
}

impl Frontier {
    pub fn new() -> Self {
        Frontier {
            root_host: String::new(),
            queue: VecDeque::new(),
            visited: HashSet::new(),
            state: FrontierState::Idle,
        }
    }

    // Starts the crawl of a site; the seed's host becomes the root host
    pub fn enqueue_seed(&mut self, seed: CanonicalUrl) {
        self.root_host = seed.host().to_string();
        self.visited.insert(seed.clone());
        self.queue.push_back(FrontierEntry {
            url: seed,
            no_follow: false,
        });
        self.state = FrontierState::Running;
    }

    pub fn root_host(&self) -> &str {
        &self.root_host
    }

    // The seed redirected to another host: that host is the site now
    pub fn rebase_root(&mut self, host: &str) {
        self.root_host = host.to_string();
    }

    // Queues a discovered URL unless it was seen before
    //
    // Returns: true if the URL was queued
    pub fn offer(&mut self, entry: FrontierEntry) -> bool {
        if !self.visited.insert(entry.url.clone()) {
            return false;
        }
        self.queue.push_back(entry);
        if self.state == FrontierState::Drained {
            self.state = FrontierState::Running;
        }
        true
    }

    // Records a URL as handled without queueing it (e.g. a redirect target)
    pub fn mark_visited(&mut self, url: CanonicalUrl) -> bool {
        self.visited.insert(url)
    }

    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    // Pops up to `max` entries in FIFO order
    //
    // Each entry's no_follow flag is decided here, against the root host:
    // anything off the root host is a no-follow page.
    pub fn next_batch(&mut self, max: usize) -> Vec<FrontierEntry> {
        let take = max.max(1).min(self.queue.len());
        let batch: Vec<FrontierEntry> = self
            .queue
            .drain(..take)
            .map(|mut entry| {
                entry.no_follow = entry.url.host() != self.root_host;
                entry
            })
            .collect();

        if self.queue.is_empty() && self.state == FrontierState::Running {
            self.state = FrontierState::Drained;
        }
        batch
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn state(&self) -> FrontierState {
        self.state
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does HashSet::insert() double as the "seen?" check?
//    - insert() returns false when the value was already present
//    - So check and insert are one call, there is no gap between them
//
// 2. Why drain(..take) instead of pop_front() in a loop?
//    - drain() removes a range and hands the items out as an iterator
//    - It keeps FIFO order, which is what makes the crawl breadth-first
//
// 3. Why is the no_follow flag recomputed in next_batch()?
//    - The root host can change once, when the seed redirects
//    - Deciding at pop time means entries queued earlier use the final root
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::canonicalize_seed;

    fn entry(raw: &str) -> FrontierEntry {
        FrontierEntry {
            url: canonicalize_seed(raw).unwrap(),
            no_follow: false,
        }
    }

    #[test]
    fn test_state_machine() {
        let mut frontier = Frontier::new();
        assert_eq!(frontier.state(), FrontierState::Idle);

        frontier.enqueue_seed(canonicalize_seed("example.com").unwrap());
        assert_eq!(frontier.state(), FrontierState::Running);

        let batch = frontier.next_batch(4);
        assert_eq!(batch.len(), 1);
        assert_eq!(frontier.state(), FrontierState::Drained);

        assert!(frontier.offer(entry("http://example.com/about")));
        assert_eq!(frontier.state(), FrontierState::Running);
    }

    #[test]
    fn test_duplicates_are_dispatched_once() {
        let mut frontier = Frontier::new();
        frontier.enqueue_seed(canonicalize_seed("http://example.com/").unwrap());

        let discovered = [
            "http://example.com/a",
            "http://example.com/a/",
            "https://example.com/a?x=1",
            "http://example.com/",
            "http://example.com/b#top",
            "http://example.com/b",
        ];
        let queued = discovered
            .iter()
            .filter(|raw| frontier.offer(entry(raw)))
            .count();
        assert_eq!(queued, 2);

        let mut dispatched = Vec::new();
        while frontier.pending() > 0 {
            for e in frontier.next_batch(2) {
                dispatched.push(e.url.to_string());
            }
        }
        assert_eq!(
            dispatched,
            vec!["http://example.com/", "http://example.com/a", "http://example.com/b"]
        );
    }

    #[test]
    fn test_no_follow_is_classified_against_root_host() {
        let mut frontier = Frontier::new();
        frontier.enqueue_seed(canonicalize_seed("http://example.com/").unwrap());
        frontier.offer(entry("http://other.com/x"));
        frontier.offer(entry("http://example.com/y"));

        let batch = frontier.next_batch(10);
        let flags: Vec<bool> = batch.iter().map(|e| e.no_follow).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_rebase_root_after_seed_redirect() {
        let mut frontier = Frontier::new();
        frontier.enqueue_seed(canonicalize_seed("http://example.com/").unwrap());
        frontier.next_batch(1);
        frontier.rebase_root("www.example.com");
        frontier.offer(entry("http://www.example.com/docs"));

        let batch = frontier.next_batch(1);
        assert!(!batch[0].no_follow);
        assert_eq!(frontier.root_host(), "www.example.com");
    }

    #[test]
    fn test_mark_visited_blocks_later_offers() {
        let mut frontier = Frontier::new();
        frontier.enqueue_seed(canonicalize_seed("http://example.com/").unwrap());
        assert!(frontier.mark_visited(canonicalize_seed("http://example.com/new").unwrap()));
        assert!(!frontier.offer(entry("http://example.com/new/")));
        assert!(frontier.is_visited(&canonicalize_seed("example.com/new").unwrap()));
        assert_eq!(frontier.visited_count(), 2);
    }
}
