//! McMurchie Davidson integration scheme.
//! Reference:
//!
//! [1] Goings, J. Integrals. https://joshuagoings.com/2017/04/28/integrals/
use nalgebra::Vector3;
use smallvec::SmallVec;

use crate::{
    atom::Nucleus,
    basis::{BasisFunction, ContractedGaussian, Gaussian},
};

use super::{
    utils::{coulomb_auxiliary, hermite_expansion},
    Integrator,
};

type HermiteCoefficients = SmallVec<[f64; 8]>;

#[derive(Clone, Copy, Debug, Default)]
pub struct McMurchieDavidson;

impl Integrator for McMurchieDavidson {
    type Function = BasisFunction;

    fn overlap(&self, functions: (&Self::Function, &Self::Function)) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_b.position - basis_a.position;
        let (ContractedGaussian(data_a), ContractedGaussian(data_b)) =
            (&basis_a.contracted_gaussian, &basis_b.contracted_gaussian);

        itertools::iproduct!(data_a, data_b)
            .map(|(&primitive_a, &primitive_b)| {
                primitive_a.coefficient
                    * primitive_b.coefficient
                    * primitive_overlap(primitive_a, primitive_b, diff)
            })
            .sum()
    }

    fn kinetic(&self, functions: (&Self::Function, &Self::Function)) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_b.position - basis_a.position;
        let (ContractedGaussian(data_a), ContractedGaussian(data_b)) =
            (&basis_a.contracted_gaussian, &basis_b.contracted_gaussian);

        itertools::iproduct!(data_a, data_b)
            .map(|(&primitive_a, &primitive_b)| {
                primitive_a.coefficient
                    * primitive_b.coefficient
                    * primitive_kinetic(primitive_a, primitive_b, diff)
            })
            .sum()
    }

    fn nuclear(&self, functions: (&Self::Function, &Self::Function), nuclei: &[Nucleus]) -> f64 {
        let (basis_a, basis_b) = functions;
        let diff = basis_b.position - basis_a.position;
        let (ContractedGaussian(data_a), ContractedGaussian(data_b)) =
            (&basis_a.contracted_gaussian, &basis_b.contracted_gaussian);

        let mut output = 0.0;
        for (&primitive_a, &primitive_b) in itertools::iproduct!(data_a, data_b) {
            let product_center = product_center(
                basis_a.position,
                primitive_a.exponent,
                basis_b.position,
                primitive_b.exponent,
            );

            let attraction: f64 = nuclei
                .iter()
                .map(|nucleus| {
                    primitive_nuclear(primitive_a, primitive_b, diff, product_center, nucleus)
                })
                .sum();

            output += primitive_a.coefficient * primitive_b.coefficient * attraction;
        }

        output
    }

    fn electron_repulsion(
        &self,
        functions: (
            &Self::Function,
            &Self::Function,
            &Self::Function,
            &Self::Function,
        ),
    ) -> f64 {
        let (basis_a, basis_b, basis_c, basis_d) = functions;
        let diff_ab = basis_b.position - basis_a.position;
        let diff_cd = basis_d.position - basis_c.position;

        let data_a = basis_a.contracted_gaussian.primitives();
        let data_b = basis_b.contracted_gaussian.primitives();
        let data_c = basis_c.contracted_gaussian.primitives();
        let data_d = basis_d.contracted_gaussian.primitives();

        let mut output = 0.0;
        for &primitive_a in data_a {
            for &primitive_b in data_b {
                let product_center_ab = product_center(
                    basis_a.position,
                    primitive_a.exponent,
                    basis_b.position,
                    primitive_b.exponent,
                );
                let hermite_ab = HermitePair::new(primitive_a, primitive_b, diff_ab);

                for &primitive_c in data_c {
                    for &primitive_d in data_d {
                        let product_center_cd = product_center(
                            basis_c.position,
                            primitive_c.exponent,
                            basis_d.position,
                            primitive_d.exponent,
                        );
                        let hermite_cd = HermitePair::new(primitive_c, primitive_d, diff_cd);

                        output += primitive_a.coefficient
                            * primitive_b.coefficient
                            * primitive_c.coefficient
                            * primitive_d.coefficient
                            * primitive_electron(
                                &hermite_ab,
                                &hermite_cd,
                                product_center_ab - product_center_cd,
                            );
                    }
                }
            }
        }

        output
    }
}

/// The hermite expansion coefficients of a product of two primitives, per cartesian axis.
struct HermitePair {
    exponent: f64,
    x: HermiteCoefficients,
    y: HermiteCoefficients,
    z: HermiteCoefficients,
}

impl HermitePair {
    fn new(primitive_a: Gaussian, primitive_b: Gaussian, diff: Vector3<f64>) -> Self {
        let Gaussian {
            exponent: a,
            angular: (l1, m1, n1),
            ..
        } = primitive_a;
        let Gaussian {
            exponent: b,
            angular: (l2, m2, n2),
            ..
        } = primitive_b;

        let expand = |i: i32, j: i32, diff: f64| {
            (0..=i + j)
                .map(|t| hermite_expansion([i, j, t], diff, a, b))
                .collect::<HermiteCoefficients>()
        };

        Self {
            exponent: a + b,
            x: expand(l1, l2, diff.x),
            y: expand(m1, m2, diff.y),
            z: expand(n1, n2, diff.z),
        }
    }
}

fn primitive_overlap(primitive_a: Gaussian, primitive_b: Gaussian, diff: Vector3<f64>) -> f64 {
    let Gaussian {
        exponent: exp_a,
        angular: (l1, m1, n1),
        ..
    } = primitive_a;

    let Gaussian {
        exponent: exp_b,
        angular: (l2, m2, n2),
        ..
    } = primitive_b;

    hermite_expansion([l1, l2, 0], diff.x, exp_a, exp_b)
        * hermite_expansion([m1, m2, 0], diff.y, exp_a, exp_b)
        * hermite_expansion([n1, n2, 0], diff.z, exp_a, exp_b)
        * (std::f64::consts::PI / (exp_a + exp_b)).powi(3).sqrt()
}

fn primitive_kinetic(primitive_a: Gaussian, primitive_b: Gaussian, diff: Vector3<f64>) -> f64 {
    let Gaussian {
        exponent: b_exp,
        angular: (l, m, n),
        ..
    } = primitive_b;

    let angular_step =
        |i, j, k| primitive_overlap(primitive_a, add_angular(primitive_b, [i, j, k]), diff);

    let term_0 =
        b_exp * (2 * (l + m + n) + 3) as f64 * primitive_overlap(primitive_a, primitive_b, diff);
    let term_1 = -2.0
        * b_exp.powi(2)
        * (angular_step(2, 0, 0) + angular_step(0, 2, 0) + angular_step(0, 0, 2));
    let term_2 = -0.5
        * ((l * (l - 1)) as f64 * angular_step(-2, 0, 0)
            + (m * (m - 1)) as f64 * angular_step(0, -2, 0)
            + (n * (n - 1)) as f64 * angular_step(0, 0, -2));
    term_0 + term_1 + term_2
}

fn primitive_nuclear(
    primitive_a: Gaussian,
    primitive_b: Gaussian,
    // difference of the positions of the two basis functions: b - a
    diff: Vector3<f64>,
    // the product center of the two basis functions
    product_center: Vector3<f64>,
    nucleus: &Nucleus,
) -> f64 {
    let hermite = HermitePair::new(primitive_a, primitive_b, diff);
    let p = hermite.exponent;
    let diff_nucleus = product_center - nucleus.position;

    let mut sum = 0.0;
    for (t, &e1) in hermite.x.iter().enumerate() {
        for (u, &e2) in hermite.y.iter().enumerate() {
            for (v, &e3) in hermite.z.iter().enumerate() {
                sum += e1
                    * e2
                    * e3
                    * coulomb_auxiliary(t as i32, u as i32, v as i32, 0, p, diff_nucleus);
            }
        }
    }

    (-nucleus.nuclear_charge() * std::f64::consts::TAU / p) * sum
}

fn primitive_electron(
    hermite_ab: &HermitePair,
    hermite_cd: &HermitePair,
    // difference of the product centers: P - Q
    diff_product: Vector3<f64>,
) -> f64 {
    let p = hermite_ab.exponent;
    let q = hermite_cd.exponent;
    let alpha = p * q / (p + q);

    let mut sum = 0.0;
    for (t1, &e1) in hermite_ab.x.iter().enumerate() {
        for (u1, &e2) in hermite_ab.y.iter().enumerate() {
            for (v1, &e3) in hermite_ab.z.iter().enumerate() {
                let bra = e1 * e2 * e3;

                for (t2, &e4) in hermite_cd.x.iter().enumerate() {
                    for (u2, &e5) in hermite_cd.y.iter().enumerate() {
                        for (v2, &e6) in hermite_cd.z.iter().enumerate() {
                            // (-1)^(t2 + u2 + v2)
                            let sign = if (t2 + u2 + v2) % 2 == 0 { 1.0 } else { -1.0 };

                            sum += sign
                                * bra
                                * e4
                                * e5
                                * e6
                                * coulomb_auxiliary(
                                    (t1 + t2) as i32,
                                    (u1 + u2) as i32,
                                    (v1 + v2) as i32,
                                    0,
                                    alpha,
                                    diff_product,
                                );
                        }
                    }
                }
            }
        }
    }

    2.0 * std::f64::consts::PI.powi(5).sqrt() * (p * q * (p + q).sqrt()).recip() * sum
}

#[inline(always)]
fn add_angular(gaussian: Gaussian, [i, j, k]: [i32; 3]) -> Gaussian {
    let Gaussian {
        angular: (l, m, n), ..
    } = gaussian;

    Gaussian {
        angular: (l + i, m + j, n + k),
        ..gaussian
    }
}

#[inline(always)]
fn product_center(
    a_pos: Vector3<f64>,
    a_exp: f64,
    b_pos: Vector3<f64>,
    b_exp: f64,
) -> Vector3<f64> {
    (a_exp * a_pos + b_exp * b_pos) / (a_exp + b_exp)
}
