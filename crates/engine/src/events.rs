//! Table events and listener registration.
//!
//! The rendering layer holds the engine and registers callbacks here instead of
//! looking the table up through a page-global name.

use pmgrid_core::filter::FilterSet;

use crate::sort::SortState;

#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    DataReplaced { total: usize },
    FilterChanged(FilterSet),
    SearchChanged(Option<String>),
    SortChanged(SortState),
    PageChanged { page: usize, page_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&TableEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, f: Listener) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, f));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Listeners run in registration order.
    pub(crate) fn emit(&mut self, event: &TableEvent) {
        for (_, f) in self.entries.iter_mut() {
            f(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_listeners_in_order_until_removed() {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut ls = Listeners::default();
        let a = {
            let log = Rc::clone(&log);
            ls.add(Box::new(move |e: &TableEvent| log.borrow_mut().push(format!("a:{:?}", e))))
        };
        {
            let log = Rc::clone(&log);
            ls.add(Box::new(move |_: &TableEvent| log.borrow_mut().push("b".to_string())));
        }
        ls.emit(&TableEvent::DataReplaced { total: 3 });
        assert_eq!(*log.borrow(), vec!["a:DataReplaced { total: 3 }".to_string(), "b".to_string()]);

        assert!(ls.remove(a));
        assert!(!ls.remove(a));
        assert_eq!(ls.len(), 1);
        log.borrow_mut().clear();
        ls.emit(&TableEvent::SearchChanged(None));
        assert_eq!(*log.borrow(), vec!["b".to_string()]);
    }
}
