//! Piecewise-linear interpolation over scattered two-dimensional samples.
//!
//! The sample coordinates are triangulated and a query is answered by barycentric weighting of
//! the values at the corners of the enclosing triangle. The triangulation is built by sweeping
//! the points in lexicographic order and joining each new point to the hull edges it can see.
//! Edges are then flipped until every triangle is Delaunay. The triangles cover the whole convex
//! hull of the samples. Queries outside it have no value: nothing is extrapolated.
//!
//! Coordinates are rescaled to the unit square before triangulating, as reference tables often
//! span several orders of magnitude on one axis only (e.g. durations of 1 to 8000 hours against
//! powers of 100 to 1000 MW). Barycentric weights are unaffected by the rescaling.
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Tolerance on barycentric weights, so that points on a triangle's edges are inside it
const BARYCENTRIC_TOLERANCE: f64 = 1e-10;

/// Orientations smaller than this (in the unit square) are treated as collinear
const COLLINEAR_TOLERANCE: f64 = 1e-12;

/// An edge is only flipped if the opposite vertex is this far inside the circumcircle, so that
/// cocircular points (e.g. on a grid) do not flip back and forth
const DELAUNAY_TOLERANCE: f64 = 1e-12;

type Point = [f64; 2];

/// Three vertex indices in counter-clockwise order
type Triangle = [usize; 3];

/// A Delaunay triangulation of a set of sample points
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    /// Sample coordinates, rescaled to the unit square
    points: Vec<Point>,
    triangles: Vec<Triangle>,
    offset: Point,
    scale: Point,
}

impl Triangulation {
    /// Triangulate the given sample coordinates.
    ///
    /// Fails if there are fewer than three points, if any coordinate is not finite, if two
    /// points coincide or if all points lie on one line.
    pub fn new(coordinates: &[(f64, f64)]) -> Result<Self> {
        ensure!(
            coordinates.len() >= 3,
            "At least three sample points are needed for interpolation (got {})",
            coordinates.len()
        );
        ensure!(
            coordinates
                .iter()
                .all(|(x, y)| x.is_finite() && y.is_finite()),
            "Sample coordinates must be finite"
        );
        for (a, b) in coordinates.iter().tuple_combinations() {
            ensure!(a != b, "Duplicate sample point ({}, {})", a.0, a.1);
        }

        let (min_x, max_x) = min_max(coordinates.iter().map(|(x, _)| *x));
        let (min_y, max_y) = min_max(coordinates.iter().map(|(_, y)| *y));
        ensure!(
            max_x > min_x && max_y > min_y,
            "Sample points must not all lie on one line"
        );

        let offset = [min_x, min_y];
        let scale = [max_x - min_x, max_y - min_y];
        let points = coordinates
            .iter()
            .map(|&(x, y)| [(x - offset[0]) / scale[0], (y - offset[1]) / scale[1]])
            .collect_vec();
        let triangles = triangulate(&points);
        ensure!(
            !triangles.is_empty(),
            "Sample points must not all lie on one line"
        );

        Ok(Self {
            points,
            triangles,
            offset,
            scale,
        })
    }

    /// The number of sample points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no sample points (never true for a valid triangulation)
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The triangles, as counter-clockwise triples of sample indices
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Find the triangle enclosing a point, with the point's barycentric weights in it
    fn locate(&self, x: f64, y: f64) -> Option<(Triangle, [f64; 3])> {
        if !(x.is_finite() && y.is_finite()) {
            return None;
        }

        let p = [
            (x - self.offset[0]) / self.scale[0],
            (y - self.offset[1]) / self.scale[1],
        ];
        self.triangles.iter().find_map(|&triangle| {
            let [a, b, c] = triangle.map(|i| self.points[i]);
            let area = orient(a, b, c);
            let weights = [
                orient(b, c, p) / area,
                orient(c, a, p) / area,
                orient(a, b, p) / area,
            ];
            weights
                .iter()
                .all(|w| *w >= -BARYCENTRIC_TOLERANCE)
                .then_some((triangle, weights))
        })
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

/// Twice the signed area of the triangle `abc` (positive if counter-clockwise)
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Whether `d` lies inside the circumcircle of the counter-clockwise triangle `abc`
fn in_circumcircle(a: Point, b: Point, c: Point, d: Point) -> bool {
    let [adx, ady] = [a[0] - d[0], a[1] - d[1]];
    let [bdx, bdy] = [b[0] - d[0], b[1] - d[1]];
    let [cdx, cdy] = [c[0] - d[0], c[1] - d[1]];
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;
    let det = adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx)
        + ad * (bdx * cdy - bdy * cdx);

    det > DELAUNAY_TOLERANCE
}

/// Triangulate points in the unit square, returning triangles as indices into `points`.
///
/// Returns no triangles if the points are (nearly) collinear.
fn triangulate(points: &[Point]) -> Vec<Triangle> {
    let order = (0..points.len())
        .sorted_by(|&i, &j| {
            let ([xi, yi], [xj, yj]) = (points[i], points[j]);
            xi.total_cmp(&xj).then(yi.total_cmp(&yj))
        })
        .collect_vec();

    // The leading points up to the first one off their line form a fan
    let Some(k) = (2..order.len()).find(|&k| {
        orient(points[order[0]], points[order[1]], points[order[k]]).abs() > COLLINEAR_TOLERANCE
    }) else {
        return Vec::new();
    };
    let mut triangles = order[..k]
        .iter()
        .tuple_windows()
        .map(|(&a, &b)| {
            if orient(points[a], points[b], points[order[k]]) > 0.0 {
                [a, b, order[k]]
            } else {
                [b, a, order[k]]
            }
        })
        .collect_vec();

    // Each later point lies outside the hull so far. It is joined to the hull edges facing it.
    for &i in &order[k + 1..] {
        let directed: HashSet<[usize; 2]> = triangles.iter().flat_map(edges).collect();
        let visible = directed
            .iter()
            .filter(|[u, v]| {
                !directed.contains(&[*v, *u])
                    && orient(points[*u], points[*v], points[i]) < -COLLINEAR_TOLERANCE
            })
            .map(|&[u, v]| [v, u, i])
            .collect_vec();
        triangles.extend(visible);
    }

    while let Some((t, u, [a, b, c, d])) = find_illegal_edge(points, &triangles) {
        triangles[t] = [a, d, c];
        triangles[u] = [d, b, c];
    }
    triangles
}

/// Find an edge `ab` shared by triangles `abc` and `bad` where `d` lies inside the circumcircle
/// of `abc` and flipping the edge to `cd` leaves two counter-clockwise triangles.
///
/// Returns the indices of both triangles with the vertices `[a, b, c, d]`.
fn find_illegal_edge(
    points: &[Point],
    triangles: &[Triangle],
) -> Option<(usize, usize, [usize; 4])> {
    let owners: HashMap<[usize; 2], usize> = triangles
        .iter()
        .enumerate()
        .flat_map(|(t, triangle)| edges(triangle).map(|edge| (edge, t)))
        .collect();

    triangles.iter().enumerate().find_map(|(t, triangle)| {
        (0..3).find_map(|start| {
            let [a, b, c] = [0, 1, 2].map(|offset| triangle[(start + offset) % 3]);
            let u = *owners.get(&[b, a])?;
            let d = triangles[u].into_iter().find(|&v| v != a && v != b)?;
            let [pa, pb, pc, pd] = [a, b, c, d].map(|v| points[v]);

            let convex = orient(pa, pd, pc) > 0.0 && orient(pd, pb, pc) > 0.0;
            (convex && in_circumcircle(pa, pb, pc, pd)).then_some((t, u, [a, b, c, d]))
        })
    })
}

fn edges(triangle: &Triangle) -> [[usize; 2]; 3] {
    let [a, b, c] = *triangle;
    [[a, b], [b, c], [c, a]]
}

/// A continuous function of two variables defined by scattered samples
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteredInterpolant {
    triangulation: Rc<Triangulation>,
    values: Vec<f64>,
}

impl ScatteredInterpolant {
    /// Build an interpolant from `((x, y), value)` samples
    pub fn new(samples: &[((f64, f64), f64)]) -> Result<Self> {
        let coordinates = samples.iter().map(|(xy, _)| *xy).collect_vec();
        let values = samples.iter().map(|(_, value)| *value).collect();

        Self::from_triangulation(Rc::new(Triangulation::new(&coordinates)?), values)
    }

    /// Build an interpolant over an existing triangulation, with one value per sample point
    pub fn from_triangulation(triangulation: Rc<Triangulation>, values: Vec<f64>) -> Result<Self> {
        ensure!(
            values.len() == triangulation.len(),
            "Expected {} sample values, got {}",
            triangulation.len(),
            values.len()
        );
        ensure!(
            values.iter().all(|v| v.is_finite()),
            "Sample values must be finite"
        );

        Ok(Self {
            triangulation,
            values,
        })
    }

    /// The interpolated value at `(x, y)`, or `None` outside the convex hull of the samples
    pub fn at(&self, x: f64, y: f64) -> Option<f64> {
        let (triangle, weights) = self.triangulation.locate(x, y)?;

        Some(
            triangle
                .iter()
                .zip(weights)
                .map(|(&i, w)| w * self.values[i])
                .sum(),
        )
    }
}
