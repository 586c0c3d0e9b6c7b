//! 2D layouts for one component.
//!
//! All strategies are deterministic: they start from vertices evenly spaced
//! on a circle and depend only on the topology.

use crate::libs::error::GraphError;
use crate::libs::graph::ComponentGraph;
use std::collections::VecDeque;
use std::f64::consts::PI;
use std::str::FromStr;

/// Places every vertex of a component in the plane
pub trait Layout: Send + Sync {
    fn name(&self) -> &'static str;

    /// One `(x, y)` per vertex, index-aligned with the component
    fn layout(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<(f64, f64)>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutKind {
    #[default]
    KamadaKawai,
    FruchtermanReingold,
    Circle,
}

impl FromStr for LayoutKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kk" | "kamada_kawai" => Ok(LayoutKind::KamadaKawai),
            "fr" | "fruchterman_reingold" => Ok(LayoutKind::FruchtermanReingold),
            "circle" => Ok(LayoutKind::Circle),
            _ => Err(GraphError::InvalidOption(format!("unknown layout {:?}", s))),
        }
    }
}

impl LayoutKind {
    pub fn build(&self) -> Box<dyn Layout> {
        match self {
            LayoutKind::KamadaKawai => Box::new(KamadaKawai::default()),
            LayoutKind::FruchtermanReingold => Box::new(FruchtermanReingold::default()),
            LayoutKind::Circle => Box::new(Circle),
        }
    }
}

fn circle(n: usize, radius: f64) -> Vec<(f64, f64)> {
    if n == 1 {
        return vec![(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Vertices evenly spaced on the unit circle
#[derive(Debug, Clone, Copy, Default)]
pub struct Circle;

impl Layout for Circle {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn layout(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<(f64, f64)>> {
        Ok(circle(graph.vertex_count, 1.0))
    }
}

/// Spring layout over graph-theoretic distances.
///
/// Every pair of vertices is joined by a spring whose rest length is their
/// hop distance; the vertex with the largest energy gradient is moved by a
/// Newton-Raphson step until all gradients fall below `epsilon`.
#[derive(Debug, Clone, Copy)]
pub struct KamadaKawai {
    pub max_iter_per_vertex: usize,
    pub epsilon: f64,
}

impl Default for KamadaKawai {
    fn default() -> Self {
        Self {
            max_iter_per_vertex: 50,
            epsilon: 1e-4,
        }
    }
}

impl KamadaKawai {
    // BFS hop counts; unreachable pairs get the longest finite distance + 1
    fn distances(graph: &ComponentGraph) -> Vec<Vec<f64>> {
        let n = graph.vertex_count;
        let adj = graph.adjacency();
        let mut dist = vec![vec![f64::INFINITY; n]; n];
        let mut longest = 0.0f64;

        for (s, row) in dist.iter_mut().enumerate() {
            row[s] = 0.0;
            let mut queue = VecDeque::from([s]);
            while let Some(u) = queue.pop_front() {
                for &(v, _) in &adj[u] {
                    if row[v].is_infinite() {
                        row[v] = row[u] + 1.0;
                        longest = longest.max(row[v]);
                        queue.push_back(v);
                    }
                }
            }
        }

        for row in dist.iter_mut() {
            for d in row.iter_mut() {
                if d.is_infinite() {
                    *d = longest + 1.0;
                }
            }
        }
        dist
    }

    // contribution of the spring (m, i) to dE/dx, dE/dy of vertex m
    fn pair_term(pm: (f64, f64), pi: (f64, f64), l: f64) -> (f64, f64) {
        let (dx, dy) = (pm.0 - pi.0, pm.1 - pi.1);
        let r = (dx * dx + dy * dy).sqrt();
        if r < 1e-12 {
            return (0.0, 0.0);
        }
        let k = 1.0 / (l * l);
        (k * (dx - l * dx / r), k * (dy - l * dy / r))
    }

    // dE/dx, dE/dy of vertex m
    fn gradient(m: usize, pos: &[(f64, f64)], dist: &[Vec<f64>]) -> (f64, f64) {
        let (mut gx, mut gy) = (0.0, 0.0);
        for (i, &pi) in pos.iter().enumerate() {
            if i == m {
                continue;
            }
            let (tx, ty) = Self::pair_term(pos[m], pi, dist[m][i]);
            gx += tx;
            gy += ty;
        }
        (gx, gy)
    }
}

impl Layout for KamadaKawai {
    fn name(&self) -> &'static str {
        "kamada_kawai"
    }

    fn layout(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<(f64, f64)>> {
        let n = graph.vertex_count;
        if n <= 2 {
            return Ok(circle(n, 0.5));
        }

        let dist = Self::distances(graph);
        let diameter = dist.iter().flatten().fold(0.0f64, |acc, &d| acc.max(d));
        let mut pos = circle(n, diameter / 2.0);

        let delta = |g: (f64, f64)| (g.0 * g.0 + g.1 * g.1).sqrt();
        let mut grads: Vec<(f64, f64)> = (0..n).map(|m| Self::gradient(m, &pos, &dist)).collect();

        for _ in 0..self.max_iter_per_vertex * n {
            let (m, g) = grads
                .iter()
                .enumerate()
                .map(|(i, &g)| (i, g))
                .fold((0, (0.0, 0.0)), |best, cur| {
                    if delta(cur.1) > delta(best.1) {
                        cur
                    } else {
                        best
                    }
                });
            if delta(g) < self.epsilon {
                break;
            }

            // Hessian of the energy at m
            let (xm, ym) = pos[m];
            let (mut hxx, mut hxy, mut hyy) = (0.0, 0.0, 0.0);
            for (i, &(xi, yi)) in pos.iter().enumerate() {
                if i == m {
                    continue;
                }
                let (dx, dy) = (xm - xi, ym - yi);
                let r2 = dx * dx + dy * dy;
                let r = r2.sqrt();
                if r < 1e-12 {
                    continue;
                }
                let l = dist[m][i];
                let k = 1.0 / (l * l);
                let r3 = r2 * r;
                hxx += k * (1.0 - l * dy * dy / r3);
                hxy += k * (l * dx * dy / r3);
                hyy += k * (1.0 - l * dx * dx / r3);
            }

            let det = hxx * hyy - hxy * hxy;
            let (step_x, step_y) = if det.abs() > 1e-12 {
                ((hxy * g.1 - hyy * g.0) / det, (hxy * g.0 - hxx * g.1) / det)
            } else {
                (-g.0 * 0.1, -g.1 * 0.1)
            };
            let moved = (xm + step_x, ym + step_y);

            // only the springs attached to m change
            for (i, grad) in grads.iter_mut().enumerate() {
                if i == m {
                    continue;
                }
                let old = Self::pair_term(pos[i], pos[m], dist[i][m]);
                let new = Self::pair_term(pos[i], moved, dist[i][m]);
                grad.0 += new.0 - old.0;
                grad.1 += new.1 - old.1;
            }
            pos[m] = moved;
            grads[m] = Self::gradient(m, &pos, &dist);
        }

        Ok(pos)
    }
}

/// Force-directed layout: neighbors attract, all pairs repel, and the
/// maximum displacement cools linearly to zero.
#[derive(Debug, Clone, Copy)]
pub struct FruchtermanReingold {
    pub iterations: usize,
}

impl Default for FruchtermanReingold {
    fn default() -> Self {
        Self { iterations: 500 }
    }
}

impl Layout for FruchtermanReingold {
    fn name(&self) -> &'static str {
        "fruchterman_reingold"
    }

    fn layout(&self, graph: &ComponentGraph) -> anyhow::Result<Vec<(f64, f64)>> {
        let n = graph.vertex_count;
        if n <= 1 {
            return Ok(circle(n, 0.0));
        }

        let k = (1.0 / n as f64).sqrt();
        let mut pos = circle(n, 0.5);
        let start_temp = 0.1;

        for iter in 0..self.iterations {
            let temp = start_temp * (1.0 - iter as f64 / self.iterations as f64);
            let mut disp = vec![(0.0f64, 0.0f64); n];

            for i in 0..n {
                for j in (i + 1)..n {
                    let (dx, dy) = (pos[i].0 - pos[j].0, pos[i].1 - pos[j].1);
                    let d = (dx * dx + dy * dy).sqrt().max(1e-9);
                    let f = k * k / d;
                    disp[i].0 += dx / d * f;
                    disp[i].1 += dy / d * f;
                    disp[j].0 -= dx / d * f;
                    disp[j].1 -= dy / d * f;
                }
            }

            for &(a, b, _) in &graph.edges {
                if a == b {
                    continue;
                }
                let (dx, dy) = (pos[a].0 - pos[b].0, pos[a].1 - pos[b].1);
                let d = (dx * dx + dy * dy).sqrt().max(1e-9);
                let f = d * d / k;
                disp[a].0 -= dx / d * f;
                disp[a].1 -= dy / d * f;
                disp[b].0 += dx / d * f;
                disp[b].1 += dy / d * f;
            }

            for (p, (ddx, ddy)) in pos.iter_mut().zip(disp) {
                let len = (ddx * ddx + ddy * ddy).sqrt();
                if len > 0.0 {
                    let step = len.min(temp);
                    p.0 += ddx / len * step;
                    p.1 += ddy / len * step;
                }
            }
        }

        Ok(pos)
    }
}
