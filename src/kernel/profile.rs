use std::collections::BTreeSet;

use crate::error::GeometryError;
use crate::math::polygon_2d::{first_moment_x, point_on_segment, polylines_touch};
use crate::math::{cross_2d, same_point_2d, Point2, Point3, QuadraticBezier, Vector3, TOLERANCE};
use crate::topology::{Carrier, EntityData, EntityId, TopologyStore};

/// Number of straight pieces a Bézier segment is sampled with.
pub const BEZIER_SAMPLES: usize = 24;

/// One piece of a closed profile loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line { start: Point2, end: Point2 },
    Bezier(QuadraticBezier),
}

impl Segment {
    #[must_use]
    pub fn line(start: Point2, end: Point2) -> Self {
        Self::Line { start, end }
    }

    #[must_use]
    pub fn start(&self) -> Point2 {
        match self {
            Self::Line { start, .. } => *start,
            Self::Bezier(b) => b.p0,
        }
    }

    #[must_use]
    pub fn end(&self) -> Point2 {
        match self {
            Self::Line { end, .. } => *end,
            Self::Bezier(b) => b.p2,
        }
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        match self {
            Self::Line { start, end } => Self::line(*end, *start),
            Self::Bezier(b) => Self::Bezier(b.reversed()),
        }
    }

    /// Points along the segment, endpoints included.
    #[must_use]
    pub fn samples(&self) -> Vec<Point2> {
        match self {
            Self::Line { start, end } => vec![*start, *end],
            Self::Bezier(b) => b.sample(BEZIER_SAMPLES),
        }
    }

    /// Contribution to the signed area of a loop.
    #[must_use]
    pub fn area_term(&self) -> f64 {
        match self {
            Self::Line { start, end } => cross_2d(&start.coords, &end.coords) / 2.0,
            Self::Bezier(b) => b.area_term(),
        }
    }

    /// Arc length, polygonized for curves.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.samples().windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Returns whether the segment is a straight piece of the `u = 0` axis.
    #[must_use]
    pub fn on_axis(&self) -> bool {
        matches!(self, Self::Line { start, end } if start.x.abs() < TOLERANCE && end.x.abs() < TOLERANCE)
    }

    /// Returns whether the segment is a straight line at constant `v`.
    #[must_use]
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Line { start, end } if (start.y - end.y).abs() < TOLERANCE)
    }
}

/// A closed counter-clockwise loop of segments bounding one region.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    segments: Vec<Segment>,
}

impl Region {
    /// Axis-aligned rectangle with lower-left corner `pos`.
    #[must_use]
    pub fn rectangle(pos: Point2, size: [f64; 2]) -> Self {
        let (x0, y0) = (pos.x, pos.y);
        let (x1, y1) = (x0 + size[0], y0 + size[1]);
        let corners = [
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ];
        let segments = (0..4)
            .map(|i| Segment::line(corners[i], corners[(i + 1) % 4]))
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Signed area, exact for Bézier segments.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.segments.iter().map(Segment::area_term).sum()
    }

    /// The loop as a polygon, curves sampled.
    #[must_use]
    pub fn outline(&self) -> Vec<Point2> {
        self.segments
            .iter()
            .flat_map(|s| {
                let mut pts = s.samples();
                pts.pop();
                pts
            })
            .collect()
    }

    /// First moment of area about the `u = 0` axis.
    #[must_use]
    pub fn first_moment(&self) -> f64 {
        first_moment_x(&self.outline())
    }

    /// Corner points of the loop.
    #[must_use]
    pub fn corners(&self) -> Vec<Point2> {
        self.segments.iter().map(Segment::start).collect()
    }

    /// Ensures `point` is a corner of the loop, splitting a straight segment
    /// if it lies in its interior. Returns the index of the segment starting
    /// at `point`, or `None` when the point is not on the loop.
    fn insert_corner(&mut self, point: &Point2) -> Option<usize> {
        if let Some(i) = self.segments.iter().position(|s| same_point_2d(&s.start(), point)) {
            return Some(i);
        }
        let i = self.segments.iter().position(|s| match s {
            Segment::Line { start, end } => point_on_segment(point, start, end).is_some(),
            Segment::Bezier(_) => false,
        })?;
        let (start, end) = (self.segments[i].start(), self.segments[i].end());
        self.segments[i] = Segment::line(start, *point);
        self.segments.insert(i + 1, Segment::line(*point, end));
        Some(i + 1)
    }

    /// Splits the region in two along a curve joining two points of its loop.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::OpenProfile`] when an endpoint of the curve is
    /// not on the loop, and [`GeometryError::InvalidInput`] when the curve
    /// does not run through the region's interior.
    pub fn split_by(&self, curve: &QuadraticBezier, feature: &str) -> Result<(Region, Region), GeometryError> {
        let mut work = self.clone();
        let open = |p: &Point2| GeometryError::OpenProfile {
            feature: feature.to_owned(),
            x: p.x,
            y: p.y,
        };
        work.insert_corner(&curve.p0).ok_or_else(|| open(&curve.p0))?;
        work.insert_corner(&curve.p2).ok_or_else(|| open(&curve.p2))?;
        // The second insertion may shift the first index.
        let i0 = work.insert_corner(&curve.p0).ok_or_else(|| open(&curve.p0))?;
        let i2 = work.insert_corner(&curve.p2).ok_or_else(|| open(&curve.p2))?;

        let n = work.segments.len();
        let walk = |from: usize, to: usize| -> Vec<Segment> {
            let mut out = Vec::new();
            let mut i = from;
            while i != to {
                out.push(work.segments[i]);
                i = (i + 1) % n;
            }
            out
        };

        // p0 -> boundary -> p2, closed by the curve back to p0.
        let mut first = walk(i0, i2);
        first.push(Segment::Bezier(curve.reversed()));
        // p2 -> boundary -> p0, closed by the curve forward.
        let mut second = walk(i2, i0);
        second.push(Segment::Bezier(*curve));

        let (a, b) = (Region { segments: first }, Region { segments: second });
        let (area_a, area_b) = (a.area(), b.area());
        let tolerance = TOLERANCE * self.area().abs().max(1.0);
        if area_a <= tolerance || area_b <= tolerance || (area_a + area_b - self.area()).abs() > tolerance * 1e3 {
            return Err(GeometryError::InvalidInput {
                feature: feature.to_owned(),
                reason: "curve does not partition the region".into(),
            });
        }
        Ok((a, b))
    }
}

/// An object in a planar sketch.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchObject {
    Solid(Vec<Region>),
    Curve(QuadraticBezier),
}

/// Ordered objects of a planar sketch, keyed by the tag that created them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    objects: Vec<(String, SketchObject)>,
}

impl Sketch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: impl Into<String>, object: SketchObject) {
        self.objects.push((tag.into(), object));
    }

    /// Removes and returns an object.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnknownFeature`] if no object has the tag.
    pub fn take(&mut self, tag: &str) -> Result<SketchObject, GeometryError> {
        let i = self
            .objects
            .iter()
            .position(|(t, _)| t == tag)
            .ok_or_else(|| GeometryError::UnknownFeature(tag.to_owned()))?;
        Ok(self.objects.remove(i).1)
    }

    /// Solid objects with their regions.
    pub fn solids(&self) -> impl Iterator<Item = (&str, &[Region])> {
        self.objects.iter().filter_map(|(tag, object)| match object {
            SketchObject::Solid(regions) => Some((tag.as_str(), regions.as_slice())),
            SketchObject::Curve(_) => None,
        })
    }

    /// Partitions the solid inputs by the curve inputs into object `tag`.
    ///
    /// # Errors
    ///
    /// Fails when curves touch or cross each other, when a curve end is not
    /// on a region outline, or when a curve collapses to a point.
    pub fn convert_to_solid(&mut self, tag: &str, inputs: &[String]) -> Result<(), GeometryError> {
        let mut regions = Vec::new();
        let mut curves = Vec::new();
        for input in inputs {
            match self.take(input)? {
                SketchObject::Solid(r) => regions.extend(r),
                SketchObject::Curve(c) => curves.push((input.as_str(), c)),
            }
        }
        if regions.is_empty() {
            return Err(GeometryError::InvalidInput {
                feature: tag.to_owned(),
                reason: "no closed input to convert".into(),
            });
        }
        for (name, curve) in &curves {
            if curve.is_degenerate() {
                return Err(GeometryError::Degenerate(format!("curve {name} collapses to a point")));
            }
        }
        for (i, (_, a)) in curves.iter().enumerate() {
            for (_, b) in &curves[i + 1..] {
                if polylines_touch(&a.sample(BEZIER_SAMPLES), &b.sample(BEZIER_SAMPLES)) {
                    return Err(GeometryError::SelfIntersecting {
                        feature: tag.to_owned(),
                    });
                }
            }
        }
        for (_, curve) in &curves {
            let host = regions
                .iter()
                .position(|r| {
                    let outline = r.outline();
                    [curve.p0, curve.p2].iter().all(|p| on_outline(&outline, p))
                })
                .ok_or_else(|| {
                    let stray = [curve.p0, curve.p2]
                        .into_iter()
                        .find(|p| !regions.iter().any(|r| on_outline(&r.outline(), p)))
                        .unwrap_or(curve.p0);
                    GeometryError::OpenProfile {
                        feature: tag.to_owned(),
                        x: stray.x,
                        y: stray.y,
                    }
                })?;
            let (a, b) = regions[host].split_by(curve, tag)?;
            regions[host] = a;
            regions.insert(host + 1, b);
        }
        self.add(tag, SketchObject::Solid(regions));
        Ok(())
    }

    /// Removes the listed regions of object `input`, storing the rest as `tag`.
    ///
    /// # Errors
    ///
    /// Fails when the input is unknown, not a solid, or nothing would remain.
    pub fn delete(&mut self, tag: &str, input: &str, regions: &BTreeSet<usize>) -> Result<(), GeometryError> {
        let SketchObject::Solid(all) = self.take(input)? else {
            return Err(GeometryError::InvalidInput {
                feature: tag.to_owned(),
                reason: format!("{input} is not a solid"),
            });
        };
        let kept: Vec<Region> = all
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !regions.contains(i))
            .map(|(_, r)| r)
            .collect();
        if kept.is_empty() {
            return Err(GeometryError::Degenerate(format!("{tag} deletes every region of {input}")));
        }
        self.add(tag, SketchObject::Solid(kept));
        Ok(())
    }

    /// Materializes the sketch into a store, using `frame` to embed it.
    ///
    /// Returns the store and, per domain, the owning object and region index.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is inconsistent.
    pub fn to_store(&self, frame: &Frame) -> Result<(TopologyStore, Vec<(EntityId, String, usize)>), GeometryError> {
        let mut store = TopologyStore::new();
        let mut owners = Vec::new();
        for (tag, object) in &self.objects {
            match object {
                SketchObject::Solid(regions) => {
                    for (i, region) in regions.iter().enumerate() {
                        let (face, _) = embed_region(&mut store, region, frame, Some(tag))?;
                        owners.push((face, tag.clone(), i));
                    }
                }
                SketchObject::Curve(curve) => {
                    embed_segment(&mut store, &Segment::Bezier(*curve), frame);
                }
            }
        }
        Ok((store, owners))
    }
}

fn on_outline(outline: &[Point2], p: &Point2) -> bool {
    let n = outline.len();
    (0..n).any(|i| point_on_segment(p, &outline[i], &outline[(i + 1) % n]).is_some())
}

/// Placement of a planar sketch in space: `(u, v)` maps to
/// `origin + u * u_axis + v * v_axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Point3,
    pub u_axis: Vector3,
    pub v_axis: Vector3,
}

impl Frame {
    /// The `xy` plane, used for 2D models and for profile selections.
    #[must_use]
    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            u_axis: Vector3::x(),
            v_axis: Vector3::y(),
        }
    }

    /// The `xz` plane turned by `angle` radians about the `z` axis.
    #[must_use]
    pub fn revolved(angle: f64) -> Self {
        Self {
            origin: Point3::origin(),
            u_axis: Vector3::new(angle.cos(), angle.sin(), 0.0),
            v_axis: Vector3::z(),
        }
    }

    #[must_use]
    pub fn embed(&self, p: &Point2) -> Point3 {
        self.origin + self.u_axis * p.x + self.v_axis * p.y
    }

    #[must_use]
    pub fn normal(&self) -> Vector3 {
        self.u_axis.cross(&self.v_axis)
    }
}

/// Adds a segment as an edge, reusing an identical existing edge.
pub fn embed_segment(store: &mut TopologyStore, segment: &Segment, frame: &Frame) -> EntityId {
    let samples: Vec<Point3> = segment.samples().iter().map(|p| frame.embed(p)).collect();
    let start = store.vertex_at(frame.embed(&segment.start()));
    let end = store.vertex_at(frame.embed(&segment.end()));
    if let Some(existing) = store.find_matching(1, &[start, end], &samples) {
        return existing;
    }
    let carrier = match segment {
        Segment::Line { .. } => Carrier::line(&samples[0], &samples[samples.len() - 1]),
        Segment::Bezier(_) => Carrier::Curved,
    };
    store.add(EntityData::new(1, carrier, vec![start, end], samples, segment.length()))
}

/// Adds a region as a planar face bounded by its segments.
///
/// Returns the face and the edge of every segment, in loop order.
///
/// # Errors
///
/// Returns [`GeometryError::Degenerate`] for a region without area.
pub fn embed_region(
    store: &mut TopologyStore,
    region: &Region,
    frame: &Frame,
    origin: Option<&str>,
) -> Result<(EntityId, Vec<EntityId>), GeometryError> {
    let area = region.area();
    if area.abs() < TOLERANCE {
        return Err(GeometryError::Degenerate("region without area".into()));
    }
    let edges: Vec<EntityId> = region
        .segments()
        .iter()
        .map(|s| embed_segment(store, s, frame))
        .collect();
    let mut unique = Vec::with_capacity(edges.len());
    for &e in &edges {
        if !unique.contains(&e) {
            unique.push(e);
        }
    }
    let mut face = EntityData::new(2, Carrier::plane(frame.origin, frame.normal()), unique, Vec::new(), area.abs());
    if let Some(tag) = origin {
        face = face.with_origin(tag);
    }
    Ok((store.add(face), edges))
}
