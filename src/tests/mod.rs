use crate::network::{Branch, BranchId, Bus, BusId, BusKind, NetworkDescription};

pub(crate) fn assert_close(a: f64, b: f64, tol: f64) {
    assert!(
        (a - b).abs() <= tol,
        "assertion failed: |{} - {}| = {:e} > {:e}",
        a,
        b,
        (a - b).abs(),
        tol
    );
}

fn source(id: usize) -> Bus {
    Bus {
        id: BusId(id),
        kind: BusKind::Slack,
        vn_kv: 20.0,
        vm_pu: 1.0,
        va_degree: 0.0,
        p_mw: 0.0,
        q_mvar: 0.0,
        p_gen_mw: 0.0,
        q_gen_mvar: 0.0,
    }
}

fn load(id: usize, p_mw: f64, q_mvar: f64) -> Bus {
    Bus {
        kind: BusKind::Load,
        p_mw,
        q_mvar,
        ..source(id)
    }
}

fn line(id: usize, from: usize, to: usize) -> Branch {
    Branch {
        id: BranchId(id),
        from_bus: BusId(from),
        to_bus: BusId(to),
        r_ohm_per_km: 0.2,
        x_ohm_per_km: 0.4,
        length_km: 1.0,
    }
}

/// Source feeding a single 1 MW load over 0.2 + j0.4 ohm at 20 kV.
pub(crate) fn twobus() -> NetworkDescription {
    NetworkDescription {
        name: "twobus".to_string(),
        sn_mva: 1.0,
        buses: vec![source(0), load(1, 1.0, 0.0)],
        branches: vec![line(0, 0, 1)],
    }
}

/// Three spokes from the source at bus 0 with a lateral 3 -> 4. The spoke
/// to bus 1 is the weakest and collapses first, at a multiplier of about
/// 26.218.
pub(crate) fn star() -> NetworkDescription {
    NetworkDescription {
        name: "star".to_string(),
        sn_mva: 1.0,
        buses: vec![
            source(0),
            load(1, 11.78634, 0.0),
            load(2, 5.0, 1.0),
            load(3, 2.0, 0.5),
            load(4, 1.0, 0.3),
        ],
        branches: vec![line(0, 0, 1), line(1, 0, 2), line(2, 0, 3), line(3, 3, 4)],
    }
}

/// `n` buses in series; branch `i` connects bus `i` to bus `i + 1`.
pub(crate) fn chain(n: usize) -> NetworkDescription {
    let mut buses = vec![source(0)];
    buses.extend((1..n).map(|i| load(i, 0.5, 0.1)));
    NetworkDescription {
        name: format!("chain{}", n),
        sn_mva: 1.0,
        buses,
        branches: (0..n.saturating_sub(1)).map(|i| line(i, i, i + 1)).collect(),
    }
}
