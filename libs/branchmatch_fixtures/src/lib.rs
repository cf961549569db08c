//! Synthetic road networks and GPS tracks used by the `branchmatch` tests and benchmarks.
//!
//! Every coordinate is given in meters on a local east/north plane anchored at [`ORIGIN`],
//! which lies on the equator so that both axes share the same scale. Use [`to_lng_lat`] to
//! convert into WGS84 degrees.

/// Longitude and latitude of the local plane's origin.
pub const ORIGIN: (f64, f64) = (13.0, 0.0);

/// Meters covered by one degree along the equator using the mean earth radius.
pub const METERS_PER_DEGREE: f64 = 111_195.08;

/// Converts a local `(x, y)` offset in meters into `(lng, lat)` degrees.
pub fn to_lng_lat((x, y): (f64, f64)) -> (f64, f64) {
    (ORIGIN.0 + x / METERS_PER_DEGREE, ORIGIN.1 + y / METERS_PER_DEGREE)
}

/// A single road segment between two junction nodes.
#[derive(Debug, Clone)]
pub struct RoadFixture {
    pub id: u64,
    pub start: u64,
    pub end: u64,
    /// OSM style `highway` class, such as `residential` or `motorway`.
    pub class: &'static str,
    /// OSM style `oneway` value: `no`, `yes` or `-1`.
    pub one_way: &'static str,
    pub urban: bool,
    pub path: Vec<(f64, f64)>,
}

impl RoadFixture {
    fn new(id: u64, (start, end): (u64, u64), class: &'static str, path: &[(f64, f64)]) -> Self {
        RoadFixture {
            id,
            start,
            end,
            class,
            one_way: "no",
            urban: true,
            path: path.to_vec(),
        }
    }

    fn one_way(mut self, value: &'static str) -> Self {
        self.one_way = value;
        self
    }

    fn rural(mut self) -> Self {
        self.urban = false;
        self
    }
}

/// A track point as `(x, y, seconds since start)`.
pub type TrackFixture = &'static [(f64, f64, i64)];

/// A straight main road of four 200m segments along `y = 0` with two side streets
/// heading north at `x = 200` and `x = 400`, joined by a parallel road at `y = 200`.
///
/// ```text
///        6 ----7---- 7
///        |           |
///        5           6
///        |           |
/// 1 --1-- 2 ---2---- 3 ---3--- 4 ---4--- 5
/// ```
pub fn ladder() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(1, (1, 2), "residential", &[(0.0, 0.0), (200.0, 0.0)]),
        RoadFixture::new(2, (2, 3), "residential", &[(200.0, 0.0), (400.0, 0.0)]),
        RoadFixture::new(3, (3, 4), "residential", &[(400.0, 0.0), (600.0, 0.0)]),
        RoadFixture::new(4, (4, 5), "residential", &[(600.0, 0.0), (800.0, 0.0)]),
        RoadFixture::new(5, (2, 6), "residential", &[(200.0, 0.0), (200.0, 200.0)]),
        RoadFixture::new(6, (3, 7), "residential", &[(400.0, 0.0), (400.0, 200.0)]),
        RoadFixture::new(7, (6, 7), "residential", &[(200.0, 200.0), (400.0, 200.0)]),
    ]
}

/// Dense track along the main road of [`ladder`], four meters north of it, every 40m / 4s.
pub const LADDER_STRAIGHT: TrackFixture = &[
    (10.0, 4.0, 0),
    (50.0, 4.0, 4),
    (90.0, 4.0, 8),
    (130.0, 4.0, 12),
    (170.0, 4.0, 16),
    (210.0, 4.0, 20),
    (250.0, 4.0, 24),
    (290.0, 4.0, 28),
    (330.0, 4.0, 32),
    (370.0, 4.0, 36),
    (410.0, 4.0, 40),
    (450.0, 4.0, 44),
    (490.0, 4.0, 48),
    (530.0, 4.0, 52),
    (570.0, 4.0, 56),
    (610.0, 4.0, 60),
    (650.0, 4.0, 64),
    (690.0, 4.0, 68),
    (730.0, 4.0, 72),
    (770.0, 4.0, 76),
];

/// Track over [`ladder`] with a sampling gap spanning the whole of segment 2.
pub const LADDER_SPARSE: TrackFixture = &[
    (10.0, 4.0, 0),
    (60.0, 4.0, 5),
    (110.0, 4.0, 10),
    (450.0, 4.0, 60),
    (500.0, 4.0, 65),
    (550.0, 4.0, 70),
];

/// Track over [`ladder`] that covers the same road in far too little time.
pub const LADDER_TELEPORT: TrackFixture = &[
    (10.0, 4.0, 0),
    (60.0, 4.0, 1),
    (110.0, 4.0, 2),
    (450.0, 4.0, 3),
    (500.0, 4.0, 4),
];

/// Two disconnected 300m roads with a 300m hole between them.
pub fn gap() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(10, (11, 12), "secondary", &[(0.0, 0.0), (300.0, 0.0)]).rural(),
        RoadFixture::new(11, (13, 14), "secondary", &[(600.0, 0.0), (900.0, 0.0)]).rural(),
    ]
}

/// Track over [`gap`] which crosses the hole between both roads.
pub const GAP_CROSSING: TrackFixture = &[
    (20.0, 4.0, 0),
    (80.0, 4.0, 6),
    (140.0, 4.0, 12),
    (200.0, 4.0, 18),
    (260.0, 4.0, 24),
    (640.0, 4.0, 62),
    (700.0, 4.0, 68),
    (760.0, 4.0, 74),
    (820.0, 4.0, 80),
];

/// A single 100m one-way road without any connections.
pub fn dead_end_one_way() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(100, (101, 102), "residential", &[(0.0, 0.0), (100.0, 0.0)])
            .one_way("yes"),
    ]
}

/// Three points within five meters of [`dead_end_one_way`].
pub const DEAD_END_TRACK: TrackFixture = &[(20.0, 3.0, 0), (50.0, 3.0, 3), (80.0, 3.0, 6)];

/// A 100m road turning north into a second 100m road at `x = 100`.
pub fn corner() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(20, (21, 22), "residential", &[(0.0, 0.0), (100.0, 0.0)]),
        RoadFixture::new(21, (22, 23), "residential", &[(100.0, 0.0), (100.0, 100.0)]),
    ]
}

/// Cuts the corner of [`corner`]: the third fix lies close to both roads,
/// the fourth is off the network.
pub const CORNER_TRACK: TrackFixture = &[(20.0, 2.0, 0), (60.0, 2.0, 4), (98.0, 10.0, 8), (140.0, 60.0, 16)];

/// Two residential roads joined by a 30m connector (`41`) between `x = 100` and `x = 130`.
pub fn connector() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(40, (41, 42), "residential", &[(0.0, 0.0), (100.0, 0.0)]),
        RoadFixture::new(41, (42, 43), "residential", &[(100.0, 0.0), (130.0, 0.0)]),
        RoadFixture::new(42, (43, 44), "residential", &[(130.0, 0.0), (300.0, 0.0)]),
    ]
}

/// [`connector`] with the connector bent north into a loop of about 67m.
pub fn looped_connector() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(40, (41, 42), "residential", &[(0.0, 0.0), (100.0, 0.0)]),
        RoadFixture::new(41, (42, 43), "residential", &[(100.0, 0.0), (115.0, 30.0), (130.0, 0.0)]),
        RoadFixture::new(42, (43, 44), "residential", &[(130.0, 0.0), (300.0, 0.0)]),
    ]
}

/// Two meters north of [`connector`], with no fix on the connector itself.
pub const CONNECTOR_TRACK: TrackFixture = &[
    (20.0, 2.0, 0),
    (60.0, 2.0, 4),
    (95.0, 2.0, 8),
    (136.0, 2.0, 12),
    (180.0, 2.0, 16),
    (220.0, 2.0, 20),
];

/// A primary road of three 100m segments (`30..=32`), with a residential
/// detour (`33`, `34`) around the middle one.
///
/// ```text
///                 35
///               /    \
///             33      34
///             /        \
/// 31 --30-- 32 ---31--- 33 --32-- 34
/// ```
pub fn bypass() -> Vec<RoadFixture> {
    vec![
        RoadFixture::new(30, (31, 32), "primary", &[(0.0, 0.0), (100.0, 0.0)]),
        RoadFixture::new(31, (32, 33), "primary", &[(100.0, 0.0), (200.0, 0.0)]),
        RoadFixture::new(32, (33, 34), "primary", &[(200.0, 0.0), (300.0, 0.0)]),
        RoadFixture::new(33, (32, 35), "residential", &[(100.0, 0.0), (150.0, 30.0)]),
        RoadFixture::new(34, (35, 33), "residential", &[(150.0, 30.0), (200.0, 0.0)]),
    ]
}

/// Drives straight along the primary road of [`bypass`].
pub const BYPASS_TRACK: TrackFixture = &[
    (20.0, 2.0, 0),
    (60.0, 2.0, 4),
    (95.0, 2.0, 8),
    (150.0, 4.0, 12),
    (250.0, 2.0, 16),
    (290.0, 2.0, 20),
];

/// A one-way motorway split into twenty 30m pieces (`200..=219`, nodes `300..=320`).
pub fn motorway_chain() -> Vec<RoadFixture> {
    (0..20u64)
        .map(|offset| {
            let from = offset as f64 * 30.0;
            RoadFixture::new(
                200 + offset,
                (300 + offset, 301 + offset),
                "motorway",
                &[(from, 0.0), (from + 30.0, 0.0)],
            )
            .one_way("yes")
            .rural()
        })
        .collect()
}

/// Sparse motorway track, one fix every 100m.
pub const MOTORWAY_SPARSE: TrackFixture = &[
    (15.0, 4.0, 0),
    (115.0, 4.0, 4),
    (215.0, 4.0, 8),
    (315.0, 4.0, 12),
    (415.0, 4.0, 16),
    (515.0, 4.0, 20),
];

/// A track far away from every fixture network.
pub const FAR_AWAY: TrackFixture = &[(90_000.0, 90_000.0, 0), (90_040.0, 90_000.0, 4)];

/// A square grid of `size` x `size` junctions spaced `spacing` meters apart.
///
/// Horizontal segments are numbered first, row by row, followed by the vertical ones.
pub fn grid(size: u64, spacing: f64) -> Vec<RoadFixture> {
    let node = |row: u64, col: u64| row * size + col + 1;
    let position = |row: u64, col: u64| (col as f64 * spacing, row as f64 * spacing);

    let mut roads = Vec::new();
    let mut id = 1;

    for row in 0..size {
        for col in 0..size.saturating_sub(1) {
            let path = [position(row, col), position(row, col + 1)];
            roads.push(RoadFixture::new(id, (node(row, col), node(row, col + 1)), "residential", &path));
            id += 1;
        }
    }

    for col in 0..size {
        for row in 0..size.saturating_sub(1) {
            let path = [position(row, col), position(row + 1, col)];
            roads.push(RoadFixture::new(id, (node(row, col), node(row + 1, col)), "tertiary", &path));
            id += 1;
        }
    }

    roads
}

/// A staircase track over [`grid`], alternating east and north every `spacing` meters,
/// sampled every `step` meters at 10 m/s and offset 3m from the road.
pub fn staircase(size: u64, spacing: f64, step: f64) -> Vec<(f64, f64, i64)> {
    let mut points = Vec::new();
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let limit = (size.saturating_sub(1)) as f64 * spacing;
    let mut travelled = 0.0;
    let mut east = true;

    loop {
        let (target_x, target_y) = if east { (x + spacing, y) } else { (x, y + spacing) };
        if target_x > limit || target_y > limit {
            break;
        }

        let mut offset = step / 2.0;

        while offset < spacing {
            let (px, py) = if east { (x + offset, y + 3.0) } else { (x + 3.0, y + offset) };
            points.push((px, py, ((travelled + offset) / 10.0) as i64));
            offset += step;
        }

        travelled += spacing;
        x = target_x;
        y = target_y;
        east = !east;
    }

    points
}
