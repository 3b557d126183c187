// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Directional focus search.
//!
//! Starting from the focused widget, the search sweeps the grid one row or
//! column of cells at a time in the requested direction. Within each step it
//! looks at the cells overlapped by a swept rectangle: the start widget's
//! extent perpendicular to the motion (inset by half a unit), stretched along
//! the motion to the extent of the boundary widget. The nearest enabled,
//! focusable widget whose leading edge lies beyond the start widget's trailing
//! edge wins.
//!
//! Reaching the boundary widget's edge, or running off the grid, applies the
//! [`BoundaryRule`] from the [`NavigationReply`].

use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Point, Rect};

use crate::compose::{GridId, GridSet};
use crate::types::{Axis, CellCoord, UserIndex, WidgetFlags};
use crate::widget::WidgetSource;

/// Slack used when comparing edges, in grid units.
const EDGE_EPSILON: f64 = 0.1;

/// Inset applied to the swept rectangle's perpendicular extent.
const SWEEP_INSET: f64 = 0.5;

/// Direction of a focus move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward smaller x.
    Left,
    /// Toward larger x.
    Right,
    /// Toward smaller y.
    Up,
    /// Toward larger y.
    Down,
}

/// What happens when navigation reaches the boundary widget's edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryRule {
    /// Leave the boundary and keep looking.
    #[default]
    Escape,
    /// Focus [`NavigationReply::focus_recipient`].
    Explicit,
    /// Continue from the opposite edge of the boundary.
    Wrap,
    /// Stay put.
    Stop,
    /// Ask [`NavigationReply::focus_delegate`].
    Custom,
    /// Ask [`NavigationReply::focus_delegate`], also when running off the grid.
    CustomBoundary,
}

/// Callback choosing a focus target for a [`BoundaryRule::Custom`] rule.
pub type FocusDelegate<'a, K> = &'a dyn Fn(Direction) -> Option<K>;

/// How a boundary widget wants navigation across its edges handled.
#[derive(Clone, Copy)]
pub struct NavigationReply<'a, K> {
    /// The rule to apply.
    pub rule: BoundaryRule,
    /// Unless the rule is [`BoundaryRule::Escape`], only descendants of this
    /// widget are eligible.
    pub handler: Option<K>,
    /// Target of [`BoundaryRule::Explicit`].
    pub focus_recipient: Option<K>,
    /// Target chooser of [`BoundaryRule::Custom`] and [`BoundaryRule::CustomBoundary`].
    pub focus_delegate: Option<FocusDelegate<'a, K>>,
}

impl<K: Debug> Debug for NavigationReply<'_, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NavigationReply")
            .field("rule", &self.rule)
            .field("handler", &self.handler)
            .field("focus_recipient", &self.focus_recipient)
            .field("has_delegate", &self.focus_delegate.is_some())
            .finish()
    }
}

impl<K> Default for NavigationReply<'_, K> {
    fn default() -> Self {
        Self::escape()
    }
}

impl<'a, K> NavigationReply<'a, K> {
    const fn with_rule(rule: BoundaryRule) -> Self {
        Self {
            rule,
            handler: None,
            focus_recipient: None,
            focus_delegate: None,
        }
    }

    /// Keep looking past the boundary.
    pub const fn escape() -> Self {
        Self::with_rule(BoundaryRule::Escape)
    }

    /// Stop at the boundary.
    pub const fn stop() -> Self {
        Self::with_rule(BoundaryRule::Stop)
    }

    /// Wrap to the opposite edge of the boundary.
    pub const fn wrap() -> Self {
        Self::with_rule(BoundaryRule::Wrap)
    }

    /// Send focus to `recipient` at the boundary.
    pub const fn explicit(recipient: K) -> Self {
        Self {
            rule: BoundaryRule::Explicit,
            handler: None,
            focus_recipient: Some(recipient),
            focus_delegate: None,
        }
    }

    /// Ask `delegate` at the boundary.
    pub const fn custom(delegate: FocusDelegate<'a, K>) -> Self {
        Self {
            rule: BoundaryRule::Custom,
            handler: None,
            focus_recipient: None,
            focus_delegate: Some(delegate),
        }
    }

    /// Ask `delegate` at the boundary and when running off the grid.
    pub const fn custom_boundary(delegate: FocusDelegate<'a, K>) -> Self {
        Self {
            rule: BoundaryRule::CustomBoundary,
            handler: None,
            focus_recipient: None,
            focus_delegate: Some(delegate),
        }
    }

    /// Restrict candidates to descendants of `handler`.
    #[must_use]
    pub fn with_handler(mut self, handler: K) -> Self {
        self.handler = Some(handler);
        self
    }

    fn delegate(&self, direction: Direction) -> Option<K> {
        self.focus_delegate.and_then(|delegate| delegate(direction))
    }
}

/// Per-direction comparison and edge selection.
#[derive(Clone, Copy, Debug)]
struct Sweep {
    axis: Axis,
    forward: bool,
}

impl Sweep {
    const fn new(direction: Direction) -> Self {
        let (axis, forward) = match direction {
            Direction::Left => (Axis::X, false),
            Direction::Right => (Axis::X, true),
            Direction::Up => (Axis::Y, false),
            Direction::Down => (Axis::Y, true),
        };
        Self { axis, forward }
    }

    fn step(self) -> i64 {
        if self.forward { 1 } else { -1 }
    }

    /// Whether `a` lies further along the motion than `b`, with slack.
    fn beyond(self, a: f64, b: f64) -> bool {
        if self.forward {
            a + EDGE_EPSILON > b
        } else {
            a - EDGE_EPSILON < b
        }
    }

    /// The edge a rectangle leaves through.
    fn trailing(self, rect: Rect) -> f64 {
        match (self.axis, self.forward) {
            (Axis::X, true) => rect.x1,
            (Axis::X, false) => rect.x0,
            (Axis::Y, true) => rect.y1,
            (Axis::Y, false) => rect.y0,
        }
    }

    /// The edge a rectangle is entered through.
    fn leading(self, rect: Rect) -> f64 {
        match (self.axis, self.forward) {
            (Axis::X, true) => rect.x0,
            (Axis::X, false) => rect.x1,
            (Axis::Y, true) => rect.y0,
            (Axis::Y, false) => rect.y1,
        }
    }

    fn swept(self, widget: Rect, boundary: Rect) -> Rect {
        match self.axis {
            Axis::X => Rect::new(
                boundary.x0,
                widget.y0 + SWEEP_INSET,
                boundary.x1,
                widget.y1 - SWEEP_INSET,
            ),
            Axis::Y => Rect::new(
                widget.x0 + SWEEP_INSET,
                boundary.y0,
                widget.x1 - SWEEP_INSET,
                boundary.y1,
            ),
        }
    }

    fn cross_extent(self, rect: Rect) -> (f64, f64) {
        match self.axis {
            Axis::X => (rect.y0, rect.y1),
            Axis::Y => (rect.x0, rect.x1),
        }
    }

    fn with_axis(self, point: Point, value: f64) -> Point {
        match self.axis {
            Axis::X => Point::new(value, point.y),
            Axis::Y => Point::new(point.x, value),
        }
    }

    fn cell(self, along: u32, across: u32) -> CellCoord {
        match self.axis {
            Axis::X => CellCoord::new(along, across),
            Axis::Y => CellCoord::new(across, along),
        }
    }
}

fn intersects_inclusive(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

impl<K: Copy + Eq + Hash + Debug> GridSet<K> {
    /// Find the widget focus should move to from `start` in `direction`.
    ///
    /// `boundary` is the widget whose edges bound the search and `reply` says
    /// what happens at those edges. Candidates must be enabled, focusable, and
    /// compatible with `user`. Returns `None` when nothing qualifies or the
    /// rule says to stay put.
    pub fn find_next_focusable_widget<S>(
        &self,
        target: GridId,
        source: &S,
        start: K,
        direction: Direction,
        reply: &NavigationReply<'_, K>,
        boundary: K,
        user: UserIndex,
    ) -> Option<K>
    where
        S: WidgetSource<K> + ?Sized,
    {
        let grid = self.get(target)?;
        let grid_rect = |widget: &K| {
            source
                .paint_geometry(widget)
                .map(|g| grid.window_to_grid(&g).bounding_rect())
        };
        let widget_rect = grid_rect(&start)?;
        let boundary_rect = grid_rect(&boundary)?;

        let sweep = Sweep::new(direction);
        let swept = sweep.swept(widget_rect, boundary_rect);
        let count = grid.cells.count();
        let start_cell = grid.cells.coord_of(widget_rect.center())?;
        let along_count = i64::from(count.on(sweep.axis));
        let across_count = count.on(sweep.axis.cross());
        let (across_min, across_max) = sweep.cross_extent(swept);
        let stride_min = grid.cells.axis_coord(across_min, across_count);
        let stride_max = grid.cells.axis_coord(across_max, across_count);

        let grids = self.collect_composed(target);
        let starting = i64::from(start_cell.on(sweep.axis));
        let mut along = starting;
        let mut trailing = sweep.trailing(widget_rect);
        let mut wrapped = false;

        // Row or column to resume from after wrapping to the boundary's other edge.
        let wrap_along = grid
            .cells
            .coord_of(sweep.with_axis(widget_rect.center(), sweep.leading(swept)))
            .map_or(starting, |cell| i64::from(cell.on(sweep.axis)));

        while (0..along_count).contains(&along) {
            let processed = along;
            along += sweep.step();
            let Ok(row) = u32::try_from(processed) else {
                break;
            };

            let mut best: Option<(K, Rect)> = None;
            for across in stride_min..=stride_max {
                let cell = sweep.cell(row, across);
                for candidate in self.collapsed_cell(&grids, cell).iter().rev() {
                    let Some(owner) = self.get(candidate.grid) else {
                        continue;
                    };
                    let Some(record) = owner.record(candidate.key) else {
                        continue;
                    };
                    let widget = record.widget;
                    let Some(flags) = source.flags(&widget) else {
                        continue;
                    };
                    if !record.user.is_compatible(user) {
                        continue;
                    }
                    let Some(rect) = source
                        .paint_geometry(&widget)
                        .map(|g| owner.window_to_grid(&g).bounding_rect())
                    else {
                        continue;
                    };
                    if !sweep.beyond(sweep.leading(rect), trailing)
                        || !intersects_inclusive(swept, rect)
                    {
                        continue;
                    }
                    if let Some((_, best_rect)) = best {
                        if !sweep.beyond(sweep.leading(best_rect), sweep.leading(rect)) {
                            continue;
                        }
                    }
                    if reply.rule != BoundaryRule::Escape {
                        if let Some(handler) = reply.handler {
                            if !is_paint_descendant(source, handler, widget) {
                                continue;
                            }
                        }
                    }
                    if !flags.contains(WidgetFlags::ENABLED | WidgetFlags::FOCUSABLE) {
                        continue;
                    }
                    best = Some((widget, rect));
                }
            }

            if let Some((widget, rect)) = best {
                // The candidate sits on the boundary's far edge.
                if sweep.beyond(sweep.leading(rect), sweep.trailing(swept)) {
                    match reply.rule {
                        BoundaryRule::Explicit => return reply.focus_recipient,
                        BoundaryRule::Custom | BoundaryRule::CustomBoundary => {
                            return reply.delegate(direction);
                        }
                        BoundaryRule::Stop => return None,
                        BoundaryRule::Wrap => {
                            if wrapped {
                                return None;
                            }
                            trailing = sweep.leading(swept);
                            along = wrap_along;
                            wrapped = true;
                            continue;
                        }
                        BoundaryRule::Escape => {}
                    }
                }
                tracing::trace!(?start, ?direction, found = ?widget, "focus target");
                return Some(widget);
            }

            if wrapped && processed == starting {
                break;
            }

            if !(0..along_count).contains(&along) {
                match reply.rule {
                    BoundaryRule::Wrap => {
                        if wrapped {
                            break;
                        }
                        trailing = sweep.leading(swept);
                        along = wrap_along;
                        wrapped = true;
                    }
                    BoundaryRule::CustomBoundary => return reply.delegate(direction),
                    _ => {}
                }
            }
        }
        tracing::trace!(?start, ?direction, "no focus target");
        None
    }
}

/// Whether `widget` is painted somewhere under `ancestor`. A widget is not its own descendant.
fn is_paint_descendant<K, S>(source: &S, ancestor: K, widget: K) -> bool
where
    K: Copy + Eq,
    S: WidgetSource<K> + ?Sized,
{
    let mut current = source.paint_parent(&widget);
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = source.paint_parent(&parent);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::HitTestGrid;
    use crate::test_host::TestHost;
    use crate::types::WidgetSort;
    use kurbo::Size;

    struct Row {
        host: TestHost,
        set: GridSet<u32>,
        id: GridId,
        cells: [u32; 3],
    }

    /// Three 50x50 widgets at x = 0, 100, 200 in a 512x128 window.
    fn row() -> Row {
        let mut host = TestHost::new(Size::new(512.0, 128.0));
        let cells = [0.0, 100.0, 200.0].map(|x| host.leaf(Rect::new(x, 0.0, x + 50.0, 50.0)));
        let mut grid = HitTestGrid::new();
        grid.set_area(Point::ORIGIN, Point::ORIGIN, host.size);
        for &w in &cells {
            grid.add_widget(&host, w, WidgetSort::default());
        }
        let mut set = GridSet::new();
        let id = set.insert(grid);
        Row {
            host,
            set,
            id,
            cells,
        }
    }

    impl Row {
        fn next(
            &self,
            from: u32,
            direction: Direction,
            reply: &NavigationReply<'_, u32>,
        ) -> Option<u32> {
            self.set.find_next_focusable_widget(
                self.id,
                &self.host,
                from,
                direction,
                reply,
                TestHost::ROOT,
                UserIndex::Any,
            )
        }
    }

    #[test]
    fn moves_to_the_nearest_neighbor() {
        let r = row();
        let [a, b, c] = r.cells;
        assert_eq!(r.next(b, Direction::Right, &NavigationReply::stop()), Some(c));
        assert_eq!(r.next(b, Direction::Left, &NavigationReply::stop()), Some(a));
        assert_eq!(r.next(a, Direction::Right, &NavigationReply::escape()), Some(b));
        assert_eq!(r.next(b, Direction::Up, &NavigationReply::escape()), None);
        assert_eq!(r.next(b, Direction::Down, &NavigationReply::escape()), None);
    }

    #[test]
    fn stop_and_wrap_at_the_edge() {
        let r = row();
        let [a, _, c] = r.cells;
        assert_eq!(r.next(c, Direction::Right, &NavigationReply::stop()), None);
        assert_eq!(r.next(c, Direction::Right, &NavigationReply::wrap()), Some(a));
        assert_eq!(r.next(a, Direction::Left, &NavigationReply::wrap()), Some(c));
    }

    #[test]
    fn custom_boundary_asks_the_delegate_off_grid() {
        let r = row();
        let [a, _, c] = r.cells;
        let delegate = |direction: Direction| (direction == Direction::Right).then_some(a);
        let reply = NavigationReply::custom_boundary(&delegate);
        assert_eq!(r.next(c, Direction::Right, &reply), Some(a));
        assert_eq!(r.next(a, Direction::Left, &reply), None);

        // A plain custom rule only applies at the boundary edge.
        let reply = NavigationReply::custom(&delegate);
        assert_eq!(r.next(c, Direction::Right, &reply), None);
    }

    struct Bounded {
        host: TestHost,
        set: GridSet<u32>,
        id: GridId,
        group: u32,
        first: u32,
        last: u32,
        neighbor: u32,
    }

    /// A 160-wide group holding two widgets, with a third widget touching its right edge.
    fn bounded() -> Bounded {
        let mut host = TestHost::new(Size::new(512.0, 128.0));
        let group = host.leaf(Rect::new(0.0, 0.0, 160.0, 60.0));
        host.set_flags(group, WidgetFlags::HIT_TEST_VISIBLE | WidgetFlags::ENABLED);
        let first = host.child(group, Rect::new(0.0, 0.0, 50.0, 50.0));
        let last = host.child(group, Rect::new(100.0, 0.0, 150.0, 50.0));
        let neighbor = host.leaf(Rect::new(160.0, 0.0, 200.0, 50.0));
        let mut grid = HitTestGrid::new();
        grid.set_area(Point::ORIGIN, Point::ORIGIN, host.size);
        for w in [group, first, last, neighbor] {
            grid.add_widget(&host, w, WidgetSort::default());
        }
        let mut set = GridSet::new();
        let id = set.insert(grid);
        Bounded {
            host,
            set,
            id,
            group,
            first,
            last,
            neighbor,
        }
    }

    impl Bounded {
        fn next(
            &self,
            from: u32,
            direction: Direction,
            reply: &NavigationReply<'_, u32>,
        ) -> Option<u32> {
            self.set.find_next_focusable_widget(
                self.id,
                &self.host,
                from,
                direction,
                reply,
                self.group,
                UserIndex::Any,
            )
        }
    }

    #[test]
    fn explicit_rule_hands_focus_to_the_recipient_at_the_edge() {
        let b = bounded();
        let reply = NavigationReply::explicit(b.group);
        assert_eq!(b.next(b.last, Direction::Right, &reply), Some(b.group));
        // Inside the group the rule does not apply.
        assert_eq!(b.next(b.first, Direction::Right, &reply), Some(b.last));
        // Running off the grid does not consult the recipient.
        assert_eq!(b.next(b.first, Direction::Left, &reply), None);
    }

    #[test]
    fn custom_rule_asks_the_delegate_at_the_edge() {
        let b = bounded();
        let asked = |direction: Direction| (direction == Direction::Right).then_some(99_u32);
        let reply = NavigationReply::custom(&asked);
        assert_eq!(b.next(b.last, Direction::Right, &reply), Some(99));

        let declined = |_: Direction| -> Option<u32> { None };
        let reply = NavigationReply::custom(&declined);
        assert_eq!(b.next(b.last, Direction::Right, &reply), None);
    }

    #[test]
    fn stop_and_wrap_at_a_touching_neighbor() {
        let b = bounded();
        assert_eq!(b.next(b.last, Direction::Right, &NavigationReply::stop()), None);
        assert_eq!(
            b.next(b.last, Direction::Right, &NavigationReply::wrap()),
            Some(b.first)
        );
        assert_eq!(
            b.next(b.last, Direction::Right, &NavigationReply::escape()),
            Some(b.neighbor)
        );
    }

    #[test]
    fn skips_disabled_and_unfocusable_widgets() {
        let mut r = row();
        let [a, b, c] = r.cells;
        r.host.set_flags(b, WidgetFlags::HIT_TEST_VISIBLE | WidgetFlags::ENABLED);
        assert_eq!(r.next(a, Direction::Right, &NavigationReply::stop()), Some(c));
        r.host.set_flags(c, WidgetFlags::HIT_TEST_VISIBLE | WidgetFlags::FOCUSABLE);
        assert_eq!(r.next(a, Direction::Right, &NavigationReply::stop()), None);
    }

    #[test]
    fn handler_limits_candidates_to_its_descendants() {
        let mut host = TestHost::new(Size::new(512.0, 128.0));
        let group = host.leaf(Rect::new(0.0, 0.0, 160.0, 60.0));
        let first = host.child(group, Rect::new(0.0, 0.0, 50.0, 50.0));
        let second = host.child(group, Rect::new(100.0, 0.0, 150.0, 50.0));
        let outside = host.leaf(Rect::new(200.0, 0.0, 250.0, 50.0));
        host.set_flags(group, WidgetFlags::HIT_TEST_VISIBLE | WidgetFlags::ENABLED);

        let mut grid = HitTestGrid::new();
        grid.set_area(Point::ORIGIN, Point::ORIGIN, host.size);
        for w in [group, first, second, outside] {
            grid.add_widget(&host, w, WidgetSort::default());
        }
        let mut set = GridSet::new();
        let id = set.insert(grid);

        let next = |from, reply: &NavigationReply<'_, u32>| {
            set.find_next_focusable_widget(
                id,
                &host,
                from,
                Direction::Right,
                reply,
                TestHost::ROOT,
                UserIndex::Any,
            )
        };
        let stop = NavigationReply::stop().with_handler(group);
        assert_eq!(next(first, &stop), Some(second));
        assert_eq!(next(second, &stop), None);
        // Escape ignores the handler.
        let escape = NavigationReply::escape().with_handler(group);
        assert_eq!(next(second, &escape), Some(outside));
    }

    #[test]
    fn user_index_filters_candidates() {
        let mut host = TestHost::new(Size::new(512.0, 128.0));
        let a = host.leaf(Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = host.leaf(Rect::new(100.0, 0.0, 150.0, 50.0));
        let c = host.leaf(Rect::new(200.0, 0.0, 250.0, 50.0));
        let mut grid = HitTestGrid::new();
        grid.set_area(Point::ORIGIN, Point::ORIGIN, host.size);
        grid.add_widget(&host, a, WidgetSort::default());
        grid.add_widget_for_user(&host, b, WidgetSort::default(), UserIndex::User(3));
        grid.add_widget(&host, c, WidgetSort::default());
        let mut set = GridSet::new();
        let id = set.insert(grid);

        let reply = NavigationReply::stop();
        let next = |user| {
            set.find_next_focusable_widget(
                id,
                &host,
                a,
                Direction::Right,
                &reply,
                TestHost::ROOT,
                user,
            )
        };
        assert_eq!(next(UserIndex::User(3)), Some(b));
        assert_eq!(next(UserIndex::User(4)), Some(c));
    }

    #[test]
    fn empty_grid_finds_nothing() {
        let mut host = TestHost::new(Size::new(512.0, 128.0));
        let a = host.leaf(Rect::new(0.0, 0.0, 50.0, 50.0));
        let mut set = GridSet::new();
        let id = set.insert(HitTestGrid::new());
        assert_eq!(
            set.find_next_focusable_widget(
                id,
                &host,
                a,
                Direction::Right,
                &NavigationReply::escape(),
                TestHost::ROOT,
                UserIndex::Any,
            ),
            None
        );
    }
}
