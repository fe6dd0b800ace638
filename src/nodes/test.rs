use super::actions::{CompareProperty, SetProperty};
use super::*;
use crate::{
    library::TreeLibrary,
    port::PortSpec,
    Blackboard, Context, NodeProperty, State, Tree,
};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Default)]
struct Calls {
    start: usize,
    update: usize,
    stop: usize,
}

/// Returns the scripted results in order, repeating the last one, and
/// records its lifecycle calls.
#[derive(Clone, Debug)]
struct Scripted {
    results: Vec<State>,
    ticks: usize,
    calls: Rc<RefCell<Calls>>,
}

impl ActionNode for Scripted {
    fn on_start(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) {
        self.calls.borrow_mut().start += 1;
    }

    fn on_update(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) -> State {
        self.calls.borrow_mut().update += 1;
        let state = self.results[self.ticks.min(self.results.len() - 1)];
        self.ticks += 1;
        state
    }

    fn on_stop(&mut self, _ctx: &mut Context, _blackboard: &mut Blackboard) {
        self.calls.borrow_mut().stop += 1;
    }
}

fn scripted(results: &[State]) -> (Node, Rc<RefCell<Calls>>) {
    let calls = Rc::new(RefCell::new(Calls::default()));
    let node = Node::action(Scripted {
        results: results.to_vec(),
        ticks: 0,
        calls: calls.clone(),
    });
    (node, calls)
}

use State::{Failure, Running, Success};

/// A tree with `composite` under the root and one scripted child per script.
fn tree_with(composite: Node, scripts: &[&[State]]) -> (Tree, NodeId, Vec<Rc<RefCell<Calls>>>) {
    let mut tree = Tree::new("test");
    let root = tree.root();
    let parent = tree.add_child(root, composite).unwrap();
    let calls = scripts
        .iter()
        .map(|script| {
            let (node, calls) = scripted(script);
            tree.add_child(parent, node).unwrap();
            calls
        })
        .collect();
    (tree, parent, calls)
}

#[test]
fn test_sequencer_fails_fast() {
    let (mut tree, _, calls) = tree_with(Node::sequencer(), &[&[Success], &[Failure], &[Success]]);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Failure);
    assert_eq!(calls[0].borrow().update, 1);
    assert_eq!(calls[1].borrow().update, 1);
    assert_eq!(calls[2].borrow().update, 0);
}

#[test]
fn test_sequencer_resumes() {
    let (mut tree, _, calls) =
        tree_with(Node::sequencer(), &[&[Success], &[Running, Success], &[Success]]);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(calls[2].borrow().update, 0);

    assert_eq!(tree.update(&mut ctx), Success);
    // The first child is not ticked again while the sequence is running.
    assert_eq!(calls[0].borrow().update, 1);
    assert_eq!(calls[1].borrow().update, 2);
    assert_eq!(calls[1].borrow().start, 1);
    assert_eq!(calls[2].borrow().update, 1);
}

#[test]
fn test_selector() {
    let (mut tree, _, calls) =
        tree_with(Node::selector(), &[&[Failure], &[Running, Success], &[Success]]);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(calls[0].borrow().update, 1);
    assert_eq!(calls[1].borrow().update, 2);
    assert_eq!(calls[2].borrow().update, 0);

    // A new episode scans from the first child again.
    tree.reset(&mut ctx);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(calls[0].borrow().update, 2);
    assert_eq!(calls[1].borrow().update, 3);
}

#[test]
fn test_random_selector_commits() {
    let (mut tree, _, calls) = tree_with(
        Node::random_selector(),
        &[&[Running], &[Running], &[Running]],
    );
    let mut ctx = Context::with_seed(7);
    for _ in 0..3 {
        assert_eq!(tree.update(&mut ctx), Running);
    }
    let updates: Vec<usize> = calls.iter().map(|calls| calls.borrow().update).collect();
    assert_eq!(updates.iter().sum::<usize>(), 3);
    assert_eq!(updates.iter().filter(|&&n| n == 3).count(), 1);

    let mut empty = Tree::new("empty");
    let root = empty.root();
    empty.add_child(root, Node::random_selector()).unwrap();
    assert_eq!(empty.update(&mut ctx), Failure);
}

#[test]
fn test_interrupt_selector() {
    let mut tree = Tree::new("interrupt");
    let flag = tree.add_key("flag", false).unwrap();
    let root = tree.root();
    let sel = tree.add_child(root, Node::interrupt_selector()).unwrap();
    tree.add_child(sel, Node::action(CompareProperty::new(flag.id(), true)))
        .unwrap();
    let (node, second) = scripted(&[Running, Success]);
    tree.add_child(sel, node).unwrap();
    let (node, third) = scripted(&[Success]);
    tree.add_child(sel, node).unwrap();

    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(second.borrow().update, 1);

    tree.blackboard_mut().set(flag, true);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(second.borrow().update, 1);
    assert_eq!(second.borrow().stop, 1);
    assert_eq!(third.borrow().update, 0);
}

#[test]
fn test_parallel_failure_aborts_the_rest() {
    let (mut tree, _, calls) = tree_with(
        Node::parallel(),
        &[&[Running], &[Running, Running, Failure], &[Running]],
    );
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Failure);

    assert_eq!(calls[0].borrow().stop, 1);
    assert_eq!(calls[2].borrow().stop, 1);
    // The failed child is stopped by its own completion, not aborted.
    assert_eq!(calls[1].borrow().stop, 1);
    assert_eq!(calls[2].borrow().update, 2);
}

#[test]
fn test_parallel_success() {
    let (mut tree, _, calls) = tree_with(Node::parallel(), &[&[Success], &[Running, Success]]);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Success);
    // Finished children are not ticked again in the same episode.
    assert_eq!(calls[0].borrow().update, 1);
    assert_eq!(calls[1].borrow().update, 2);
}

fn switch_tree(
    interruptable: bool,
) -> (Tree, crate::blackboard::Key<i32>, Vec<Rc<RefCell<Calls>>>) {
    let mut tree = Tree::new("switch");
    let index = tree.add_key("index", 0).unwrap();
    let root = tree.root();
    let switch = tree
        .add_child(root, Node::switch(NodeProperty::bound(index), interruptable))
        .unwrap();
    let calls = (0..2)
        .map(|_| {
            let (node, calls) = scripted(&[Running]);
            tree.add_child(switch, node).unwrap();
            calls
        })
        .collect();
    (tree, index, calls)
}

#[test]
fn test_interruptable_switch() {
    let (mut tree, index, calls) = switch_tree(true);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(calls[0].borrow().update, 1);

    tree.blackboard_mut().set(index, 1);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(calls[0].borrow().stop, 1);
    assert_eq!(calls[1].borrow().start, 1);
    assert_eq!(calls[1].borrow().update, 1);

    tree.blackboard_mut().set(index, 5);
    assert_eq!(tree.update(&mut ctx), Failure);
    assert_eq!(calls[1].borrow().stop, 1);
}

#[test]
fn test_fixed_switch() {
    let (mut tree, index, calls) = switch_tree(false);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Running);
    tree.blackboard_mut().set(index, 1);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(calls[0].borrow().update, 2);
    assert_eq!(calls[0].borrow().stop, 0);
    assert_eq!(calls[1].borrow().update, 0);
}

#[test]
fn test_switch_out_of_range() {
    let mut tree = Tree::new("switch");
    let root = tree.root();
    let switch = tree
        .add_child(root, Node::switch(NodeProperty::new(-1), true))
        .unwrap();
    let (node, calls) = scripted(&[Success]);
    tree.add_child(switch, node).unwrap();
    assert_eq!(tree.update(&mut Context::with_seed(0)), Failure);
    assert_eq!(calls.borrow().update, 0);
}

#[test]
fn test_abort_stops_every_node_once() {
    let mut tree = Tree::new("abort");
    let root = tree.root();
    let seq = tree.add_child(root, Node::sequencer()).unwrap();
    let (a, a_calls) = scripted(&[Running]);
    tree.add_child(seq, a).unwrap();
    let inv = tree.add_child(seq, Node::inverter()).unwrap();
    let (b, b_calls) = scripted(&[Success]);
    tree.add_child(inv, b).unwrap();

    let mut ctx = Context::with_seed(0);
    // Nothing has started: aborting is still one on_stop per node.
    tree.abort(root, &mut ctx);
    assert_eq!(a_calls.borrow().stop, 1);
    assert_eq!(b_calls.borrow().stop, 1);
    assert_eq!(a_calls.borrow().start, 0);

    tree.abort(root, &mut ctx);
    assert_eq!(a_calls.borrow().stop, 2);
    assert_eq!(b_calls.borrow().stop, 2);

    assert_eq!(tree.update(&mut ctx), Running);
    tree.abort(seq, &mut ctx);
    assert_eq!(a_calls.borrow().stop, 3);
    assert_eq!(b_calls.borrow().stop, 3);
    assert!(tree.descendants(seq).iter().all(|&id| !tree[id].started()));
    assert!(tree
        .descendants(seq)
        .iter()
        .all(|&id| tree[id].state() == Running));
}

fn decorated(effect: Effect, script: &[State]) -> (Tree, Rc<RefCell<Calls>>) {
    let mut tree = Tree::new("decorator");
    let root = tree.root();
    let dec = tree.add_child(root, Node::decorator(effect)).unwrap();
    let (node, calls) = scripted(script);
    tree.add_child(dec, node).unwrap();
    (tree, calls)
}

#[test]
fn test_result_decorators() {
    let mut ctx = Context::with_seed(0);
    let (mut tree, _) = decorated(Effect::Inverter, &[Success]);
    assert_eq!(tree.update(&mut ctx), Failure);
    let (mut tree, _) = decorated(Effect::Inverter, &[Running]);
    assert_eq!(tree.update(&mut ctx), Running);
    let (mut tree, _) = decorated(Effect::ForceSuccess, &[Failure]);
    assert_eq!(tree.update(&mut ctx), Success);
    let (mut tree, _) = decorated(Effect::ForceFailure, &[Success]);
    assert_eq!(tree.update(&mut ctx), Failure);

    let mut tree = Tree::new("childless");
    let root = tree.root();
    tree.add_child(root, Node::inverter()).unwrap();
    assert_eq!(tree.update(&mut ctx), Failure);
}

#[test]
fn test_repeat_and_retry() {
    let mut ctx = Context::with_seed(0);
    let (mut tree, calls) = decorated(Effect::Repeat(Repeat::new(true, false, 3)), &[Success]);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(calls.borrow().start, 3);

    let (mut tree, _) = decorated(Effect::Repeat(Repeat::default()), &[Success, Failure]);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Failure);

    let (mut tree, calls) = decorated(Effect::retry(2), &[Failure]);
    assert_eq!(tree.update(&mut ctx), Running);
    assert_eq!(tree.update(&mut ctx), Failure);
    assert_eq!(calls.borrow().start, 2);
}

#[test]
fn test_timeout() {
    let mut ctx = Context::with_seed(0);
    let (mut tree, calls) = decorated(Effect::timeout(NodeProperty::new(1.0)), &[Running]);
    assert_eq!(tree.update(&mut ctx), Running);
    ctx.advance(0.5);
    assert_eq!(tree.update(&mut ctx), Running);
    ctx.advance(1.0);
    assert_eq!(tree.update(&mut ctx), Failure);
    assert_eq!(calls.borrow().update, 2);
    assert_eq!(calls.borrow().stop, 1);
}

#[test]
fn test_update_caches_result() {
    let (mut tree, _, calls) = tree_with(Node::sequencer(), &[&[Success]]);
    let mut ctx = Context::with_seed(0);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(tree.state(), Success);
    assert_eq!(calls[0].borrow().update, 1);

    tree.reset(&mut ctx);
    assert_eq!(tree.state(), Running);
    assert_eq!(tree.update(&mut ctx), Success);
    assert_eq!(calls[0].borrow().update, 2);
}

#[test]
fn test_subtree_ports() {
    let mut inner = Tree::new("Inner");
    let input = inner.add_key("input", 0).unwrap();
    let result = inner.add_key("result", false).unwrap();
    let root = inner.root();
    let seq = inner.add_child(root, Node::sequencer()).unwrap();
    inner
        .add_child(seq, Node::action(CompareProperty::new(input.id(), 5)))
        .unwrap();
    inner
        .add_child(seq, Node::action(SetProperty::new(result.id(), true)))
        .unwrap();
    let mut library = TreeLibrary::new();
    library.insert(inner);

    let mut outer = Tree::new("Outer");
    let value = outer.add_key("value", 5).unwrap();
    let done = outer.add_key("done", false).unwrap();
    let mismatched = outer.add_key("mismatched", 1.5f32).unwrap();
    let root = outer.root();
    let subtree = SubTree::new("Inner")
        .with_port(PortSpec::new_in("input", value.id()))
        .with_port(PortSpec::new_out("result", done.id()))
        .with_port(PortSpec::new_inout("input", mismatched.id()));
    let sub = outer
        .add_child(root, Node::new(NodeKind::SubTree(subtree)))
        .unwrap();

    let mut ctx = Context::with_seed(0);
    outer.bind(&mut ctx, &library);
    assert!(matches!(outer[sub].kind(), NodeKind::SubTree(st) if st.instance().is_some()));
    assert_eq!(outer.update(&mut ctx), Success);
    assert_eq!(outer.blackboard().get(done), Some(&true));
    // The float key does not fit the int port and is left alone.
    assert_eq!(outer.blackboard().get(mismatched), Some(&1.5));
    // The template in the library is untouched.
    let template = library.get("Inner").unwrap();
    assert_eq!(template.blackboard().get_value::<bool>("result"), false);
}

#[test]
fn test_subtree_abort_reaches_instance() {
    let mut inner = Tree::new("Inner");
    let root = inner.root();
    let (node, calls) = scripted(&[Running]);
    inner.add_child(root, node).unwrap();
    let mut library = TreeLibrary::new();
    library.insert(inner);

    let mut outer = Tree::new("Outer");
    let root = outer.root();
    outer.add_child(root, Node::sub_tree("Inner")).unwrap();
    let mut ctx = Context::with_seed(0);
    outer.bind(&mut ctx, &library);

    assert_eq!(outer.update(&mut ctx), Running);
    outer.reset(&mut ctx);
    assert_eq!(calls.borrow().stop, 1);
    // An idle instance is not aborted again.
    outer.reset(&mut ctx);
    assert_eq!(calls.borrow().stop, 1);
}

#[test]
fn test_unbound_subtree_fails() {
    let mut outer = Tree::new("Outer");
    let root = outer.root();
    outer.add_child(root, Node::sub_tree("Nowhere")).unwrap();
    let mut ctx = Context::with_seed(0);
    outer.bind(&mut ctx, &TreeLibrary::new());
    assert_eq!(outer.update(&mut ctx), Failure);
}
